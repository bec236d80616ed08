pub mod http_gateway_notifier;

pub use http_gateway_notifier::HttpGatewayNotifier;
