use super::segment::CallSite;
use gdexpr_catalog::{FunctionCatalog, FunctionSignature, OwnerScope, SceneQuery, ValueKind};
use tracing::debug;

/// Separator between a behavior name and its function name.
pub(crate) const BEHAVIOR_SEPARATOR: &str = "::";

/// A call site matched to a catalog signature.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Resolution<'c> {
    Static {
        signature: &'c FunctionSignature,
    },
    Object {
        object: String,
        signature: &'c FunctionSignature,
    },
    Behavior {
        object: String,
        behavior: String,
        function: String,
        signature: &'c FunctionSignature,
    },
}

impl<'c> Resolution<'c> {
    pub(crate) fn signature(&self) -> &'c FunctionSignature {
        match self {
            Resolution::Static { signature }
            | Resolution::Object { signature, .. }
            | Resolution::Behavior { signature, .. } => signature,
        }
    }

    pub(crate) fn scope(&self) -> OwnerScope {
        match self {
            Resolution::Static { .. } => OwnerScope::Static,
            Resolution::Object { .. } => OwnerScope::ObjectBound,
            Resolution::Behavior { .. } => OwnerScope::BehaviorBound,
        }
    }
}

/// Why a call site did not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Unresolved {
    /// No signature in any scope.
    NotFound,
    /// A behavior signature exists but the behavior is not attached to the
    /// object.
    BehaviorNotAttached { object: String, behavior: String },
}

/// Resolve `site` in fixed priority: static, object-bound, behavior-bound.
///
/// Objects the scene does not know resolve against the base object type
/// `""`.
pub(crate) fn resolve<'c, C, S>(
    catalog: &'c C,
    scene: &S,
    returns: ValueKind,
    site: &CallSite<'_>,
) -> Result<Resolution<'c>, Unresolved>
where
    C: FunctionCatalog + ?Sized,
    S: SceneQuery + ?Sized,
{
    let Some(owner) = &site.owner else {
        return catalog
            .static_function(returns, site.member)
            .map(|signature| Resolution::Static { signature })
            .ok_or(Unresolved::NotFound);
    };

    let object = owner.name.as_ref();
    let object_type = scene.type_of_object(object).unwrap_or("");
    if let Some(signature) = catalog.object_function(returns, object_type, site.member) {
        return Ok(Resolution::Object {
            object: object.to_string(),
            signature,
        });
    }

    let Some((behavior, function)) = site.member.split_once(BEHAVIOR_SEPARATOR) else {
        return Err(Unresolved::NotFound);
    };
    let signature = scene
        .type_of_behavior(object, behavior)
        .and_then(|behavior_type| catalog.behavior_function(returns, behavior_type, function))
        .ok_or(Unresolved::NotFound)?;
    if !scene.has_behavior(object, behavior) {
        debug!(object, behavior, function, "behavior not attached to object");
        return Err(Unresolved::BehaviorNotAttached {
            object: object.to_string(),
            behavior: behavior.to_string(),
        });
    }
    Ok(Resolution::Behavior {
        object: object.to_string(),
        behavior: behavior.to_string(),
        function: function.to_string(),
        signature,
    })
}
