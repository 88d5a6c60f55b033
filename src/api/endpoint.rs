pub type Service = str;

pub const AUTHENTICATION: &Service = "authentication";
pub const PLANT_LIST: &Service = "plantlist";
pub const PLANT: &Service = "plant";
pub const DATA: &Service = "data";
pub const LOGBOOK: &Service = "logbook";

pub const BASE_PATH: &str = "/services";
/// Fixed protocol version, also sent as `signature-version`.
pub const VERSION: u32 = 100;

pub const DEFAULT_SERVER: &str = "com.sunny-portal.de";
pub const DEFAULT_PORT: u16 = 443;

pub const CULTURE: &str = "en-gb";
pub const PLANT_IMAGE_SIZE: &str = "64px";
