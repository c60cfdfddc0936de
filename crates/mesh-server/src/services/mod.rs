//! Сервисный слой: выделение портов, реестр узлов, группы, статистика.

pub mod admin_service;
pub mod group_service;
pub mod port_allocator;
pub mod registry_service;
