//! Second-pass call binding: re-walks call sites recorded during entity
//! extraction and resolves each to a QN now that every file has been
//! ingested.

use crate::entity::EntityRegistry;
use crate::graph::{EdgeIngest, EntityRef, Label, RelationType};
use crate::inference::InferenceContext;
use crate::prescan::{Language, PreScanIndex, PreScanner};

/// A call expression observed during extraction but not yet bound to a QN.
#[derive(Debug, Clone)]
pub struct UnresolvedCall {
    pub caller_qn: String,
    pub caller_label: Label,
    pub callee_simple_name: String,
    pub receiver_qn_prefix: Option<String>,
    pub defining_module: Option<String>,
}

/// Tries, in order: the registry by full simple-name match (preferring the
/// receiver prefix), then import resolution against the caller's module,
/// then the pre-scan symbol index as a last, lower-confidence resort.
pub fn resolve_call(
    registry: &EntityRegistry,
    ctx: &InferenceContext,
    prescan: &PreScanIndex,
    call: &UnresolvedCall,
) -> Option<String> {
    if let Some(qn) = registry.find_best_match(&call.callee_simple_name, call.receiver_qn_prefix.as_deref()) {
        return Some(qn.to_string());
    }

    if let Some(module_path) = ctx.resolve_import(&call.callee_simple_name) {
        let candidate = format!("{}.{}", module_path, call.callee_simple_name);
        if registry.contains(&candidate) {
            return Some(candidate);
        }
    }

    let modules = prescan.modules_defining(&call.callee_simple_name)?;
    modules.iter().min().map(|module| format!("{}.{}", module, call.callee_simple_name))
}

/// Resolves a batch of unresolved calls into `CALLS` edges. Calls that
/// still cannot be bound are dropped rather than ingested as a guess.
pub fn resolve_calls(
    registry: &EntityRegistry,
    ctx: &InferenceContext,
    prescan: &PreScanIndex,
    calls: &[UnresolvedCall],
) -> Vec<EdgeIngest> {
    calls
        .iter()
        .filter_map(|call| {
            let target_qn = resolve_call(registry, ctx, prescan, call)?;
            let target_label = registry.label_of(&target_qn).unwrap_or(Label::Function);
            Some(EdgeIngest::new(
                EntityRef::qn(call.caller_label, call.caller_qn.clone()),
                RelationType::Calls,
                EntityRef::qn(target_label, target_qn),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(caller: &str, callee: &str, receiver: Option<&str>) -> UnresolvedCall {
        UnresolvedCall {
            caller_qn: caller.to_string(),
            caller_label: Label::Function,
            callee_simple_name: callee.to_string(),
            receiver_qn_prefix: receiver.map(|s| s.to_string()),
            defining_module: None,
        }
    }

    #[test]
    fn resolves_via_registry_with_receiver_preference() {
        let mut registry = EntityRegistry::default();
        registry.insert_entity("proj.user.User.save", Label::Method);
        registry.insert_entity("proj.audit.Audit.save", Label::Method);
        let ctx = InferenceContext::default();
        let prescan = PreScanIndex::default();

        let call = call("proj.user.User.persist", "save", Some("proj.user.User"));
        let resolved = resolve_call(&registry, &ctx, &prescan, &call);
        assert_eq!(resolved.as_deref(), Some("proj.user.User.save"));
    }

    #[test]
    fn falls_back_to_prescan_index_when_registry_misses() {
        let registry = EntityRegistry::default();
        let ctx = InferenceContext::default();
        let prescan = PreScanner::scan("helpers", Language::Python, "def format_date():\n    pass\n");

        let call = call("proj.main", "format_date", None);
        let resolved = resolve_call(&registry, &ctx, &prescan, &call);
        assert_eq!(resolved.as_deref(), Some("helpers.format_date"));
    }

    #[test]
    fn unresolvable_call_is_dropped_not_guessed() {
        let registry = EntityRegistry::default();
        let ctx = InferenceContext::default();
        let prescan = PreScanIndex::default();
        let call = call("proj.main", "nonexistent_fn", None);
        assert_eq!(resolve_call(&registry, &ctx, &prescan, &call), None);
    }
}
