pub mod change_log;
