//! Supplier patch semantics tests

use proptest::prelude::*;
use shared::{Supplier, SupplierPatch};
use uuid::Uuid;

fn supplier() -> Supplier {
    Supplier {
        id: Uuid::new_v4(),
        name: "Cool Air Engineering".to_string(),
        email: "sales@coolair.example.sg".to_string(),
        phone: "+65 6100 0000".to_string(),
        address: "12 Tuas Avenue".to_string(),
        remark: "ACMV spares".to_string(),
        active: true,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn patch_overwrites_only_present_fields() {
    let mut s = supplier();
    let patch = SupplierPatch {
        phone: Some("+65 6200 0000".to_string()),
        active: Some(false),
        ..Default::default()
    };
    patch.apply_to(&mut s);

    assert_eq!(s.phone, "+65 6200 0000");
    assert!(!s.active);
    // Everything else keeps its stored value
    assert_eq!(s.name, "Cool Air Engineering");
    assert_eq!(s.email, "sales@coolair.example.sg");
    assert_eq!(s.address, "12 Tuas Avenue");
    assert_eq!(s.remark, "ACMV spares");
}

#[test]
fn absent_fields_never_null_or_blank_values() {
    let mut s = supplier();
    let patch = SupplierPatch {
        remark: Some(String::new()),
        ..Default::default()
    };
    patch.apply_to(&mut s);

    // An explicit empty string is honoured; absence leaves fields alone
    assert_eq!(s.remark, "");
    assert_eq!(s.name, "Cool Air Engineering");
}

#[test]
fn empty_patch_is_detectable() {
    assert!(SupplierPatch::default().is_empty());
    let patch = SupplierPatch {
        active: Some(true),
        ..Default::default()
    };
    assert!(!patch.is_empty());
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Applying a patch twice equals applying it once
    #[test]
    fn patch_application_is_idempotent(
        name in proptest::option::of("[a-z]{1,12}"),
        phone in proptest::option::of("[0-9]{4,8}"),
        active in proptest::option::of(any::<bool>()),
    ) {
        let patch = SupplierPatch {
            name,
            phone,
            active,
            ..Default::default()
        };

        let mut once = supplier();
        patch.apply_to(&mut once);
        let mut twice = once.clone();
        patch.apply_to(&mut twice);

        prop_assert_eq!(once.name, twice.name);
        prop_assert_eq!(once.phone, twice.phone);
        prop_assert_eq!(once.active, twice.active);
    }

    /// An empty patch leaves every field untouched
    #[test]
    fn empty_patch_changes_nothing(_seed in any::<u8>()) {
        let before = supplier();
        let mut after = before.clone();
        SupplierPatch::default().apply_to(&mut after);

        prop_assert_eq!(before.name, after.name);
        prop_assert_eq!(before.email, after.email);
        prop_assert_eq!(before.phone, after.phone);
        prop_assert_eq!(before.address, after.address);
        prop_assert_eq!(before.remark, after.remark);
        prop_assert_eq!(before.active, after.active);
    }
}
