pub mod injector;
pub mod subscription;

pub use injector::EventInjector;
pub use subscription::ObserverSubscription;
