#[cfg(not(target_arch = "wasm32"))]
mod native {
    extern crate chirp;

    use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
    use chirp::config::Config;
    use chirp::core::db::MemoryStore;
    use chirp::core::seed::init_demo_data;
    use chirp::{router, AppState};
    use tracing::{error, info, warn};

    mod adapter {
        use actix_web::HttpRequest;
        use spin_sdk::http::{Method, Request};

        pub fn actix_to_spin_request(
            req: &HttpRequest,
            body: actix_web::web::Bytes,
        ) -> anyhow::Result<Request> {
            let method = match req.method().as_str() {
                "GET" => Method::Get,
                "POST" => Method::Post,
                "PUT" => Method::Put,
                "DELETE" => Method::Delete,
                "HEAD" => Method::Head,
                "OPTIONS" => Method::Options,
                "PATCH" => Method::Patch,
                other => anyhow::bail!("unsupported method {other}"),
            };

            let uri = req.uri().to_string();
            let body_vec = body.to_vec();

            let mut req_builder = Request::builder();
            let method_set = req_builder.method(method);
            let uri_set = method_set.uri(&uri);

            // Copy headers
            let mut with_headers = uri_set;
            for (name, value) in req.headers() {
                if let Ok(val_str) = value.to_str() {
                    with_headers = with_headers.header(name.as_str(), val_str);
                }
            }

            Ok(with_headers.body(body_vec).build())
        }

        pub fn spin_to_actix_response(spin_resp: spin_sdk::http::Response) -> actix_web::HttpResponse {
            let status = *spin_resp.status();

            let mut response = actix_web::HttpResponse::build(
                actix_web::http::StatusCode::from_u16(status)
                    .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR),
            );
            for (name, value) in spin_resp.headers() {
                if let Some(value) = value.as_str() {
                    response.append_header((name.to_string(), value.to_string()));
                }
            }

            response.body(spin_resp.body().to_vec())
        }
    }

    pub async fn run() -> std::io::Result<()> {
        chirp::init_tracing();

        let config = Config::from_env().map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
        let store = MemoryStore::new();

        if config.seed_demo {
            if let Err(e) = init_demo_data(&store) {
                warn!("demo seeding failed: {e:#}");
            }
        }
        if config.cloudinary.is_none() {
            warn!("Cloudinary credentials not set; image uploads will fail");
        }

        let address = format!("0.0.0.0:{}", config.port);
        info!("Server listening on http://{address}");

        HttpServer::new(move || {
            let state = AppState::with_configured_images(config.clone(), Box::new(store.clone()));
            App::new()
                .app_data(web::Data::new(state))
                .app_data(web::PayloadConfig::new(config.max_body_bytes + 1))
                .default_service(web::route().to(handle_all))
        })
        .bind(address)?
        .run()
        .await
    }

    async fn handle_all(state: web::Data<AppState>, req: HttpRequest, body: web::Bytes) -> HttpResponse {
        let spin_req = match adapter::actix_to_spin_request(&req, body) {
            Ok(r) => r,
            Err(e) => {
                error!("could not adapt request: {e:#}");
                return HttpResponse::BadRequest()
                    .json(serde_json::json!({"error": "Invalid request"}))
            }
        };

        let spin_resp = router::handle_request(&state, spin_req).await;
        adapter::spin_to_actix_response(spin_resp)
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    native::run().await
}

#[cfg(target_arch = "wasm32")]
fn main() {}
