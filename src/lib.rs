pub mod config;
pub mod error;
pub mod state;

pub mod crypto {
    pub mod mac;
    pub mod vault;
}

pub mod session {
    pub mod protocol;
    pub mod replay;
    pub mod token;
}

pub mod validation {
    pub mod url;
}

pub mod handlers {
    pub mod gate;
    pub mod links;
}
