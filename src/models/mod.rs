pub mod base_entity;
pub mod change_log;
pub mod city;
pub mod country;
pub mod department;
