//! Postback payload tokens
//!
//! Buttons carry a payload string. Numbered tokens carry a 1-based number
//! after their prefix; prefixes are tried longest first so that
//! `STORAGE_PAGE_2` is never read as a storage selection.

pub const GET_STARTED: &str = "GET_STARTED";
pub const HELP: &str = "HELP";
pub const SEARCH_STORAGE: &str = "SEARCH_STORAGE";
pub const CREATE_STORAGE: &str = "CREATE_STORAGE";
pub const REMOVE_STORAGE: &str = "REMOVE_STORAGE";
pub const ADD_DATA: &str = "ADD_DATA";
pub const EXIT: &str = "EXIT";

pub const STORAGE_PREFIX: &str = "STORAGE_";
pub const STORAGE_PAGE_PREFIX: &str = "STORAGE_PAGE_";
pub const REMOVE_STORAGE_PREFIX: &str = "REMOVE_STORAGE_";
pub const REMOVE_STORAGE_PAGE_PREFIX: &str = "REMOVE_STORAGE_PAGE_";

/// Decoded postback payload. Numbers are kept as sent (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Postback {
    GetStarted,
    Help,
    SearchStorage,
    CreateStorage,
    RemoveStorage,
    AddData,
    Exit,
    Storage(usize),
    StoragePage(usize),
    RemoveStorageAt(usize),
    RemoveStoragePage(usize),
    Unrecognized(String),
}

impl Postback {
    pub fn parse(payload: &str) -> Self {
        match payload {
            GET_STARTED => return Postback::GetStarted,
            HELP => return Postback::Help,
            SEARCH_STORAGE => return Postback::SearchStorage,
            CREATE_STORAGE => return Postback::CreateStorage,
            REMOVE_STORAGE => return Postback::RemoveStorage,
            ADD_DATA => return Postback::AddData,
            EXIT => return Postback::Exit,
            _ => {}
        }

        let numbered: [(&str, fn(usize) -> Postback); 4] = [
            (REMOVE_STORAGE_PAGE_PREFIX, Postback::RemoveStoragePage),
            (REMOVE_STORAGE_PREFIX, Postback::RemoveStorageAt),
            (STORAGE_PAGE_PREFIX, Postback::StoragePage),
            (STORAGE_PREFIX, Postback::Storage),
        ];

        for (prefix, build) in numbered {
            if let Some(suffix) = payload.strip_prefix(prefix) {
                return match parse_number(suffix) {
                    Some(number) => build(number),
                    None => Postback::Unrecognized(payload.to_string()),
                };
            }
        }

        Postback::Unrecognized(payload.to_string())
    }

    /// Wire form of the token
    pub fn to_payload(&self) -> String {
        match self {
            Postback::GetStarted => GET_STARTED.to_string(),
            Postback::Help => HELP.to_string(),
            Postback::SearchStorage => SEARCH_STORAGE.to_string(),
            Postback::CreateStorage => CREATE_STORAGE.to_string(),
            Postback::RemoveStorage => REMOVE_STORAGE.to_string(),
            Postback::AddData => ADD_DATA.to_string(),
            Postback::Exit => EXIT.to_string(),
            Postback::Storage(n) => format!("{}{}", STORAGE_PREFIX, n),
            Postback::StoragePage(n) => format!("{}{}", STORAGE_PAGE_PREFIX, n),
            Postback::RemoveStorageAt(n) => format!("{}{}", REMOVE_STORAGE_PREFIX, n),
            Postback::RemoveStoragePage(n) => format!("{}{}", REMOVE_STORAGE_PAGE_PREFIX, n),
            Postback::Unrecognized(raw) => raw.clone(),
        }
    }
}

fn parse_number(suffix: &str) -> Option<usize> {
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}
