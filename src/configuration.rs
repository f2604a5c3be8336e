use std::path::PathBuf;

pub trait Configuration: Clone + Send + Sync + 'static {
    fn port(&self) -> u16;
    fn database_url(&self) -> Option<String>;
    fn schedule_file(&self) -> Option<PathBuf>;
    fn mail_api_url(&self) -> Option<String>;
    fn mail_api_key(&self) -> String;
    fn mail_from(&self) -> String;
    fn operator_email(&self) -> String;
    fn booking_horizon_days(&self) -> u32;
    fn calendar_domain(&self) -> String;
}
