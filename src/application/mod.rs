// Application layer - Chart assembly over the study backend
pub mod chart_registry;
pub mod chart_service;
pub mod error;
pub mod study_repository;
