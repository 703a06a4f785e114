pub mod db;
pub mod form;
pub mod mongodb;
pub mod view;
