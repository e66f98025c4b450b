pub mod baidu;
pub mod encode;

pub use baidu::{BaiduCredentials, BaiduOcr};
