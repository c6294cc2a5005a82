//! Module Registry - ordered send and receive module collections.

use crate::error::{Error, Result};
use crate::module::{ModuleHandle, ModuleRole, RetransmissionMode};
use std::sync::Arc;

/// Order in which send modules are offered padding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum PaddingPriority {
    /// RTX with redundant payloads: padding carries useful media.
    High,
    Low,
}

impl From<RetransmissionMode> for PaddingPriority {
    fn from(mode: RetransmissionMode) -> Self {
        if mode == RetransmissionMode::RedundantPayloads {
            PaddingPriority::High
        } else {
            PaddingPriority::Low
        }
    }
}

/// A module together with the attributes fixed at registration time.
pub(crate) struct RegisteredModule {
    pub(crate) handle: ModuleHandle,
    pub(crate) remb_candidate: bool,
    /// Cached from `retransmission_mode()` on registration; a later mode
    /// change is only seen after the module is removed and added again.
    pub(crate) padding_priority: PaddingPriority,
}

impl RegisteredModule {
    pub(crate) fn is(&self, handle: &ModuleHandle) -> bool {
        Arc::ptr_eq(&self.handle, handle)
    }
}

/// Two disjoint, insertion-ordered sequences of registered modules.
#[derive(Default)]
pub(crate) struct ModuleRegistry {
    send: Vec<RegisteredModule>,
    receive: Vec<RegisteredModule>,
}

impl ModuleRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn modules(&self, role: ModuleRole) -> &[RegisteredModule] {
        match role {
            ModuleRole::Send => &self.send,
            ModuleRole::Receive => &self.receive,
        }
    }

    fn modules_mut(&mut self, role: ModuleRole) -> &mut Vec<RegisteredModule> {
        match role {
            ModuleRole::Send => &mut self.send,
            ModuleRole::Receive => &mut self.receive,
        }
    }

    /// Role the handle is currently registered under, if any.
    pub(crate) fn role_of(&self, handle: &ModuleHandle) -> Option<ModuleRole> {
        [ModuleRole::Send, ModuleRole::Receive]
            .into_iter()
            .find(|&role| self.modules(role).iter().any(|m| m.is(handle)))
    }

    /// Append `handle` to the sequence for `role`.
    ///
    /// Fails if the handle is already registered in either sequence; the
    /// registry is left unchanged in that case.
    pub(crate) fn add(
        &mut self,
        role: ModuleRole,
        handle: ModuleHandle,
        remb_candidate: bool,
    ) -> Result<()> {
        if let Some(existing) = self.role_of(&handle) {
            return Err(Error::ModuleAlreadyRegistered {
                role: existing,
                ssrc: handle.ssrc(),
            });
        }

        let padding_priority = match role {
            ModuleRole::Send => PaddingPriority::from(handle.retransmission_mode()),
            ModuleRole::Receive => PaddingPriority::Low,
        };

        self.modules_mut(role).push(RegisteredModule {
            handle,
            remb_candidate,
            padding_priority,
        });
        Ok(())
    }

    /// Remove `handle` from the sequence for `role`, keeping the relative
    /// order of the remaining modules.
    pub(crate) fn remove(&mut self, role: ModuleRole, handle: &ModuleHandle) -> Result<()> {
        let modules = self.modules_mut(role);
        let Some(index) = modules.iter().position(|m| m.is(handle)) else {
            return Err(Error::ModuleNotRegistered {
                role,
                ssrc: handle.ssrc(),
            });
        };
        modules.remove(index);
        Ok(())
    }

    /// First REMB candidate of the given role, in registration order.
    pub(crate) fn first_remb_candidate(&self, role: ModuleRole) -> Option<&ModuleHandle> {
        self.modules(role)
            .iter()
            .find(|m| m.remb_candidate)
            .map(|m| &m.handle)
    }

    /// Send modules in padding order: high priority first, then low
    /// priority, each group in registration order.
    pub(crate) fn padding_candidates(&self) -> impl Iterator<Item = &RegisteredModule> {
        let high = self
            .send
            .iter()
            .filter(|m| m.padding_priority == PaddingPriority::High);
        let low = self
            .send
            .iter()
            .filter(|m| m.padding_priority == PaddingPriority::Low);
        high.chain(low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::FakeModule;

    fn ssrcs<'a>(modules: impl Iterator<Item = &'a RegisteredModule>) -> Vec<u32> {
        modules.map(|m| m.handle.ssrc()).collect()
    }

    #[test]
    fn test_registry_preserves_insertion_order() {
        let mut registry = ModuleRegistry::new();
        for ssrc in [3, 1, 2] {
            registry
                .add(ModuleRole::Send, FakeModule::handle(ssrc), false)
                .unwrap();
        }

        assert_eq!(ssrcs(registry.modules(ModuleRole::Send).iter()), vec![3, 1, 2]);
        assert!(registry.modules(ModuleRole::Receive).is_empty());
    }

    #[test]
    fn test_registry_remove_keeps_relative_order() {
        let mut registry = ModuleRegistry::new();
        let handles: Vec<ModuleHandle> = (1..=4).map(FakeModule::handle).collect();
        for handle in &handles {
            registry
                .add(ModuleRole::Receive, handle.clone(), false)
                .unwrap();
        }

        registry.remove(ModuleRole::Receive, &handles[1]).unwrap();
        assert_eq!(
            ssrcs(registry.modules(ModuleRole::Receive).iter()),
            vec![1, 3, 4]
        );
    }

    #[test]
    fn test_registry_rejects_duplicate_handle() {
        let mut registry = ModuleRegistry::new();
        let handle = FakeModule::handle(7);
        registry.add(ModuleRole::Send, handle.clone(), true).unwrap();

        let err = registry.add(ModuleRole::Send, handle.clone(), true);
        assert_eq!(
            err,
            Err(Error::ModuleAlreadyRegistered {
                role: ModuleRole::Send,
                ssrc: 7
            })
        );

        // A handle lives in at most one of the two sequences.
        let err = registry.add(ModuleRole::Receive, handle, true);
        assert!(matches!(
            err,
            Err(Error::ModuleAlreadyRegistered {
                role: ModuleRole::Send,
                ..
            })
        ));
        assert_eq!(registry.modules(ModuleRole::Send).len(), 1);
        assert!(registry.modules(ModuleRole::Receive).is_empty());
    }

    #[test]
    fn test_registry_identity_is_by_handle_not_ssrc() {
        let mut registry = ModuleRegistry::new();
        let a = FakeModule::handle(42);
        let b = FakeModule::handle(42);

        registry.add(ModuleRole::Send, a.clone(), false).unwrap();
        registry.add(ModuleRole::Send, b.clone(), false).unwrap();
        assert_eq!(registry.modules(ModuleRole::Send).len(), 2);

        registry.remove(ModuleRole::Send, &b).unwrap();
        assert!(registry.modules(ModuleRole::Send)[0].is(&a));
    }

    #[test]
    fn test_registry_remove_unknown_handle() {
        let mut registry = ModuleRegistry::new();
        let handle = FakeModule::handle(9);

        assert_eq!(
            registry.remove(ModuleRole::Send, &handle),
            Err(Error::ModuleNotRegistered {
                role: ModuleRole::Send,
                ssrc: 9
            })
        );

        registry.add(ModuleRole::Receive, handle.clone(), false).unwrap();
        assert!(registry.remove(ModuleRole::Send, &handle).is_err());
        assert_eq!(registry.role_of(&handle), Some(ModuleRole::Receive));
    }

    #[test]
    fn test_registry_readd_after_remove() {
        let mut registry = ModuleRegistry::new();
        let handle = FakeModule::handle(5);

        registry.add(ModuleRole::Send, handle.clone(), false).unwrap();
        registry.remove(ModuleRole::Send, &handle).unwrap();
        assert_eq!(registry.role_of(&handle), None);

        registry.add(ModuleRole::Receive, handle.clone(), false).unwrap();
        assert_eq!(registry.role_of(&handle), Some(ModuleRole::Receive));
    }

    #[test]
    fn test_padding_priority_from_retransmission_mode() {
        assert_eq!(
            PaddingPriority::from(RetransmissionMode::RedundantPayloads),
            PaddingPriority::High
        );
        for mode in [
            RetransmissionMode::Off,
            RetransmissionMode::Retransmitted,
            RetransmissionMode::RetransmittedAndRedundantPayloads,
        ] {
            assert_eq!(PaddingPriority::from(mode), PaddingPriority::Low);
        }
    }

    #[test]
    fn test_padding_candidates_order() {
        let mut registry = ModuleRegistry::new();
        let modes = [
            (1, RetransmissionMode::Off),
            (2, RetransmissionMode::RedundantPayloads),
            (3, RetransmissionMode::Retransmitted),
            (4, RetransmissionMode::RedundantPayloads),
        ];
        for (ssrc, mode) in modes {
            let module = FakeModule::with_retransmission_mode(ssrc, mode);
            registry.add(ModuleRole::Send, module, false).unwrap();
        }

        assert_eq!(ssrcs(registry.padding_candidates()), vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_first_remb_candidate() {
        let mut registry = ModuleRegistry::new();
        assert!(registry.first_remb_candidate(ModuleRole::Send).is_none());

        registry
            .add(ModuleRole::Send, FakeModule::handle(1), false)
            .unwrap();
        registry
            .add(ModuleRole::Send, FakeModule::handle(2), true)
            .unwrap();
        registry
            .add(ModuleRole::Send, FakeModule::handle(3), true)
            .unwrap();

        let first = registry.first_remb_candidate(ModuleRole::Send).unwrap();
        assert_eq!(first.ssrc(), 2);
        assert!(registry.first_remb_candidate(ModuleRole::Receive).is_none());
    }
}
