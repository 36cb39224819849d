use std::sync::Arc;

use parking_lot::RwLock;

/// 表单事件
///
/// 每次写入完成并释放状态锁之后发出，监听器可以安全地读取表单。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// 数据变更；`path` 为 `None` 表示整体更新（`update_data`、`reset`）
    DataChanged { path: Option<String> },
    /// 错误表变更
    ErrorsChanged,
    /// 提交状态变更
    SubmitStateChanged { loading: bool, sent: bool },
    /// 初始数据重新设定
    InitialDataChanged,
}

impl FormEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            FormEvent::DataChanged { .. } => "DataChanged",
            FormEvent::ErrorsChanged => "ErrorsChanged",
            FormEvent::SubmitStateChanged { .. } => "SubmitStateChanged",
            FormEvent::InitialDataChanged => "InitialDataChanged",
        }
    }
}

/// 表单监听器
///
/// UI 层通过监听器把表单状态接入自己的响应式容器。
pub trait FormListener: Send + Sync {
    fn on_event(&self, event: &FormEvent);

    /// 获取监听器名称（用于日志与移除）
    fn listener_name(&self) -> &str {
        "AnonymousListener"
    }
}

impl<F> FormListener for F
where
    F: Fn(&FormEvent) + Send + Sync,
{
    fn on_event(&self, event: &FormEvent) {
        self(event)
    }
}

/// 监听器列表
#[derive(Default)]
pub(crate) struct Listeners {
    listeners: RwLock<Vec<Arc<dyn FormListener>>>,
}

impl Listeners {
    pub(crate) fn add(&self, listener: Arc<dyn FormListener>) {
        tracing::debug!("Added form listener: {}", listener.listener_name());
        self.listeners.write().push(listener);
    }

    pub(crate) fn remove(&self, listener_name: &str) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|listener| listener.listener_name() != listener_name);

        let removed = listeners.len() != before;
        if removed {
            tracing::debug!("Removed form listener: {}", listener_name);
        }
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// 逐个通知；单个监听器 panic 只记录日志，不影响其他监听器
    pub(crate) fn notify(&self, event: &FormEvent) {
        // 克隆列表，回调期间不持锁
        let listeners: Vec<_> = self.listeners.read().iter().map(Arc::clone).collect();

        if listeners.is_empty() {
            return;
        }

        tracing::trace!(
            "Notifying {} listener(s) of {}",
            listeners.len(),
            event.event_name()
        );

        for listener in listeners {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));

            if outcome.is_err() {
                tracing::error!(
                    "Listener '{}' panicked while handling event '{}'",
                    listener.listener_name(),
                    event.event_name()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Named(&'static str);

    impl FormListener for Named {
        fn on_event(&self, _event: &FormEvent) {}

        fn listener_name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_notify_reaches_closures() {
        let listeners = Listeners::default();
        let count = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&count);
        listeners.add(Arc::new(move |event: &FormEvent| {
            if matches!(event, FormEvent::ErrorsChanged) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }));

        listeners.notify(&FormEvent::ErrorsChanged);
        listeners.notify(&FormEvent::InitialDataChanged);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_by_name() {
        let listeners = Listeners::default();
        listeners.add(Arc::new(Named("ui")));
        listeners.add(Arc::new(Named("audit")));

        assert!(listeners.remove("ui"));
        assert!(!listeners.remove("ui"));
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_others() {
        let listeners = Listeners::default();
        let count = Arc::new(AtomicUsize::new(0));

        listeners.add(Arc::new(|_: &FormEvent| panic!("boom")));
        let counter = Arc::clone(&count);
        listeners.add(Arc::new(move |_: &FormEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        listeners.notify(&FormEvent::ErrorsChanged);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
