use std::path::PathBuf;

pub fn default_source_root() -> PathBuf {
    PathBuf::from("./src")
}

pub fn default_destination() -> PathBuf {
    PathBuf::from("./dist")
}

pub fn default_watch() -> bool {
    true
}

pub fn default_port() -> u16 {
    8080
}

pub fn default_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_source_maps() -> bool {
    true
}

pub fn default_debounce_ms() -> u64 {
    100
}

pub fn default_compile_timeout_ms() -> u64 {
    30_000
}

pub fn default_root_document() -> String {
    "index".to_string()
}

pub fn default_target() -> String {
    "es2020".to_string()
}
