pub mod coordination;
pub mod db;
