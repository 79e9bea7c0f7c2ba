use callback_common::{ServiceError, ServiceResult};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// 按名称注册的处理器表
///
/// - 名称去除首尾空白与前导 `/`，因此 `"/echo"` 与 `"echo"` 指向同一处理器；
/// - 同名重复注册返回 `AlreadyRegistered`，不会覆盖已有处理器。
pub(crate) struct HandlerRegistry<H> {
    kind: &'static str,
    handlers: DashMap<String, H>,
}

impl<H: Clone> HandlerRegistry<H> {
    pub(crate) fn new(kind: &'static str) -> Self {
        Self {
            kind,
            handlers: DashMap::new(),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        self.kind
    }

    /// 注册处理器，返回规范化后的名称
    pub(crate) fn register(&self, name: &str, handler: H) -> ServiceResult<String> {
        let name = normalize(name);
        if name.is_empty() {
            return Err(ServiceError::invalid_registration(format!(
                "{} name required",
                self.kind
            )));
        }

        match self.handlers.entry(name.to_string()) {
            Entry::Occupied(_) => Err(ServiceError::AlreadyRegistered {
                kind: self.kind,
                name: name.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(handler);
                Ok(name.to_string())
            }
        }
    }

    pub(crate) fn get(&self, name: &str) -> ServiceResult<H> {
        self.handlers
            .get(normalize(name))
            .map(|h| h.value().clone())
            .ok_or_else(|| ServiceError::HandlerNotFound {
                kind: self.kind,
                name: name.to_string(),
            })
    }

    /// 已注册名称（按字典序）
    pub(crate) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }
}

fn normalize(name: &str) -> &str {
    name.trim().trim_start_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_are_rejected() {
        let reg = HandlerRegistry::new("binding");
        assert_eq!(reg.register("/orders", 1).unwrap(), "orders");
        let err = reg.register("orders", 2).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::AlreadyRegistered { kind: "binding", .. }
        ));
        assert_eq!(reg.get("orders").unwrap(), 1);
    }

    #[test]
    fn empty_names_are_rejected() {
        let reg = HandlerRegistry::<u8>::new("job");
        let err = reg.register("  / ", 1).unwrap_err();
        assert_eq!(err.to_string(), "invalid registration: job name required");
    }

    #[test]
    fn lookup_normalizes_and_reports_kind() {
        let reg = HandlerRegistry::new("invocation");
        reg.register("echo", "h").unwrap();
        assert_eq!(reg.get("/echo").unwrap(), "h");
        assert!(matches!(
            reg.get("missing"),
            Err(ServiceError::HandlerNotFound { kind: "invocation", .. })
        ));
        assert_eq!(reg.names(), vec!["echo".to_string()]);
    }
}
