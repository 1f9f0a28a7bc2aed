pub mod cookies;
pub mod db;
pub mod errors;
pub mod helpers;
pub mod seed;
pub mod token;
