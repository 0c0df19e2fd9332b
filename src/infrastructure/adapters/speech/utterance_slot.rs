//! Utterance Slot - 平台回调与朗读请求的对应关系
//!
//! 平台回调只携带平台自己的 utterance id（`N`），这里把它翻译回 [`UtteranceId`]：
//! - 只有 `speak` 返回的平台 id 的 end / stop 回调会被转发
//! - 被 `clear` 取消的平台 id 记入黑名单，其迟到的回调一律丢弃
//! - 平台 id 绑定之前到达的 end / stop 先暂存，绑定时再核对

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::application::ports::{ControllerEvent, EventSender};
use crate::domain::selection::UtteranceId;

/// 记住的已取消平台 id 数量
const STOPPED_CAPACITY: usize = 8;

/// 平台回调类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Callback {
    Begin,
    End,
    Stop,
}

impl Callback {
    fn into_event(self, id: UtteranceId) -> ControllerEvent {
        match self {
            Callback::Begin => ControllerEvent::UtteranceStarted(id),
            Callback::End => ControllerEvent::UtteranceEnded(id),
            Callback::Stop => ControllerEvent::UtteranceFailed {
                id,
                reason: "Utterance was interrupted by the platform".to_string(),
            },
        }
    }
}

struct InFlight<N> {
    native: Option<N>,
    id: UtteranceId,
    events: EventSender,
}

struct SlotState<N> {
    current: Option<InFlight<N>>,
    /// 绑定前到达的 end / stop
    pending: Vec<(N, Callback)>,
    /// 已取消的平台 id
    stopped: Vec<N>,
}

/// 当前朗读槽位
pub(crate) struct UtteranceSlot<N> {
    state: Mutex<SlotState<N>>,
}

impl<N: Copy + PartialEq> UtteranceSlot<N> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                current: None,
                pending: Vec::new(),
                stopped: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState<N>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 提交给平台之前登记请求
    pub(crate) fn begin(&self, id: UtteranceId, events: EventSender) {
        let mut state = self.lock();
        state.pending.clear();
        state.current = Some(InFlight {
            native: None,
            id,
            events,
        });
    }

    /// 平台接受请求后绑定其 id，并补发绑定前暂存的回调
    pub(crate) fn bind(&self, id: UtteranceId, native: Option<N>) {
        let mut state = self.lock();
        let pending = std::mem::take(&mut state.pending);
        let Some(flight) = state.current.as_mut().filter(|f| f.id == id) else {
            return;
        };
        flight.native = native;

        let Some(native) = native else {
            return;
        };
        if let Some(&(_, callback)) = pending.iter().find(|(n, _)| *n == native) {
            let _ = flight.events.send(callback.into_event(id));
            if callback != Callback::Begin {
                state.current = None;
            }
        }
    }

    /// 平台拒绝请求时撤销登记
    pub(crate) fn abandon(&self, id: UtteranceId) {
        let mut state = self.lock();
        if state.current.as_ref().is_some_and(|f| f.id == id) {
            state.current = None;
            state.pending.clear();
        }
    }

    /// 取消当前朗读；其平台 id 之后的回调都会被丢弃
    pub(crate) fn clear(&self) {
        let mut state = self.lock();
        state.pending.clear();
        let Some(native) = state.current.take().and_then(|f| f.native) else {
            return;
        };
        if state.stopped.len() >= STOPPED_CAPACITY {
            state.stopped.remove(0);
        }
        state.stopped.push(native);
    }

    /// 把一次平台回调翻译为控制器事件
    pub(crate) fn dispatch(&self, native: N, callback: Callback) {
        let mut state = self.lock();

        if let Some(pos) = state.stopped.iter().position(|n| *n == native) {
            if callback != Callback::Begin {
                state.stopped.remove(pos);
            }
            return;
        }

        let Some(flight) = state.current.as_ref() else {
            return;
        };
        let (id, bound) = (flight.id, flight.native);

        match (bound, callback) {
            (Some(bound), _) if bound != native => {}
            // 未绑定时 begin 只可能来自刚提交的请求
            (None, Callback::Begin) => {
                let _ = flight.events.send(callback.into_event(id));
            }
            (None, _) => state.pending.push((native, callback)),
            (Some(_), Callback::Begin) => {
                let _ = flight.events.send(callback.into_event(id));
            }
            (Some(_), _) => {
                let _ = flight.events.send(callback.into_event(id));
                state.current = None;
            }
        }
    }
}
