pub mod analytics;
pub mod link_service;
pub mod redirect;
pub mod short_code;

pub use analytics::AnalyticsService;
pub use link_service::LinkService;
pub use redirect::RedirectService;
pub use short_code::{ShortCodeGenerator, MAX_CODE_LENGTH, MIN_CODE_LENGTH};
