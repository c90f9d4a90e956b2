//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                  | Connects to               |
//! |------------|-----------------------------|---------------------------|
//! | `entropy`  | EntropySource               | ESP32 hardware RNG        |
//! | `hardware` | AnalogChannel               | ESP32 ADC1 oneshot        |
//! |            | ClimateDriver               | DHT11 single-wire bus     |
//! | `log_sink` | EventSink                   | Serial log output         |
//! | `mqtt`     | MessagingSession            | ESP-IDF MQTT client       |
//! | `time`     | Clock, `DelayNs`            | ESP32 system timer        |
//! | `wifi`     | NetworkLink                 | ESP-IDF WiFi STA          |

pub mod entropy;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod time;
pub mod wifi;
