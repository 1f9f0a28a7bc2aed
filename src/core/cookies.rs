use spin_sdk::http::Request;

pub const SESSION_COOKIE: &str = "jwt";

/// Looks up `name` in the request's `Cookie` header.
pub fn read_cookie(req: &Request, name: &str) -> Option<String> {
    let header = req.header("cookie")?.as_str()?;
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Max-Age={max_age_secs}; Path=/; HttpOnly; SameSite=Strict"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn cleared_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}
