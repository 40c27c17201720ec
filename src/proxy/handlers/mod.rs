// API endpoint handlers

pub mod alchemer;
