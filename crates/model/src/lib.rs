pub mod core {
    pub mod identifiers;
    pub mod value;
}

pub mod events;

pub mod records {
    pub mod key;
    pub mod row;
}

pub mod state;
pub mod stream;
