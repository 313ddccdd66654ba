/// Common test utilities and mock infrastructure
///
/// This module provides shared functionality for integration tests including:
/// - Mock NVMe controllers with configurable Identify responses
/// - A mock device directory mapping paths to namespaces and controllers

pub mod mock_controller;
