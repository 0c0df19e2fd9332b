//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod speech_capability;

pub use speech_capability::{
    event_channel, ControllerEvent, EventReceiver, EventSender, SpeechCapabilityPort,
    SpeechError, UtteranceRequest,
};
