pub mod redis_publisher;

pub use redis_publisher::RedisPublisher;
