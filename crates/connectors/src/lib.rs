pub mod metadata {
    pub mod column;
}

pub mod sql {
    pub mod base {
        pub mod adapter;
        pub mod error;
        pub mod requests;
    }

    pub mod mysql {
        pub mod adapter;
        pub mod params;
        pub mod row;
    }
}
