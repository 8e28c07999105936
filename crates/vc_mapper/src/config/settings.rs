use serde::Serialize;

// -----------------------------------------------------------------------------
// Settings

/// Behaviour toggles resolved for one plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Tracks mapped source objects within one top-level call: a source
    /// reached twice maps to the same target, cyclic graphs terminate.
    ///
    /// Without it a cyclic source graph recurses without bound.
    pub identity_integrity: bool,
    /// Adds branches for known subtypes of the declared source and target types.
    pub infer_derived_types: bool,
    /// A zero source number does not populate a nullable identifier member
    /// (`Option<u32>` named `*Id`), the member stays `Null`.
    pub zero_identifiers_are_absent: bool,
    /// Failures inside the plan are reported to the error callbacks and
    /// then replaced by a `Null` result (or the unchanged existing target).
    pub swallow_errors: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            identity_integrity: true,
            infer_derived_types: true,
            zero_identifiers_are_absent: true,
            swallow_errors: false,
        }
    }
}

impl Settings {
    pub(crate) fn apply(&mut self, overrides: &SettingsOverride) {
        let SettingsOverride {
            identity_integrity,
            infer_derived_types,
            zero_identifiers_are_absent,
            swallow_errors,
        } = *overrides;

        if let Some(value) = identity_integrity {
            self.identity_integrity = value;
        }
        if let Some(value) = infer_derived_types {
            self.infer_derived_types = value;
        }
        if let Some(value) = zero_identifiers_are_absent {
            self.zero_identifiers_are_absent = value;
        }
        if let Some(value) = swallow_errors {
            self.swallow_errors = value;
        }
    }
}

// -----------------------------------------------------------------------------
// SettingsOverride

/// Changes to [`Settings`] for the plans of a scope, `None` keeps the value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsOverride {
    pub identity_integrity: Option<bool>,
    pub infer_derived_types: Option<bool>,
    pub zero_identifiers_are_absent: Option<bool>,
    pub swallow_errors: Option<bool>,
}

impl SettingsOverride {
    pub const fn identity_integrity(mut self, value: bool) -> Self {
        self.identity_integrity = Some(value);
        self
    }

    pub const fn infer_derived_types(mut self, value: bool) -> Self {
        self.infer_derived_types = Some(value);
        self
    }

    pub const fn zero_identifiers_are_absent(mut self, value: bool) -> Self {
        self.zero_identifiers_are_absent = Some(value);
        self
    }

    pub const fn swallow_errors(mut self, value: bool) -> Self {
        self.swallow_errors = Some(value);
        self
    }
}
