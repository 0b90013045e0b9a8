pub mod practicum;
