pub mod broadcast;
pub mod lobby_loop;
