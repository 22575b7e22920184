pub mod mutf8;
