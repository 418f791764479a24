//! Native symbol names.

use hilti_ir::CallingConvention;

/// Prefix of every function compiled from HILTI.
pub const HILTI_PREFIX: &str = "hlt_";

/// Namespace separator and its native replacement.
const SEPARATOR: &str = "::";
const NATIVE_SEPARATOR: &str = "_";

fn flatten(name: &str) -> String {
    name.replace(SEPARATOR, NATIVE_SEPARATOR)
}

/// Native name of a function.
///
/// Bridge functions keep their flattened name so that they bind to the
/// externally supplied symbol; HILTI functions get [`HILTI_PREFIX`].
pub fn function_name(name: &str, cc: CallingConvention) -> String {
    let flat = flatten(name);
    if cc.is_bridge() {
        flat
    } else {
        format!("{HILTI_PREFIX}{flat}")
    }
}

/// Native name of a non-entry block of `function` (already mangled).
pub fn block_function_name(function: &str, label: &str) -> String {
    let label = label.strip_prefix("__").unwrap_or(label);
    format!("__{function}_{label}")
}

/// Struct type name of the frame of `function` (already mangled).
pub fn frame_type_name(function: &str) -> String {
    format!("__frame_{function}")
}

/// Native name of a module-level variable.
pub fn global_name(module: &str, name: &str) -> String {
    format!("{HILTI_PREFIX}{}_{}", flatten(module), flatten(name))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn hilti_functions_are_prefixed() {
        assert_eq!(
            function_name("Foo::bar", CallingConvention::Hilti),
            "hlt_Foo_bar"
        );
    }

    #[test]
    fn bridge_functions_keep_their_name() {
        assert_eq!(function_name("Hilti::print", CallingConvention::C), "Hilti_print");
        assert_eq!(function_name("strlen", CallingConvention::CHilti), "strlen");
    }

    #[test]
    fn block_names() {
        assert_eq!(block_function_name("hlt_main", "loop"), "__hlt_main_loop");
        assert_eq!(block_function_name("hlt_main", "__b2"), "__hlt_main_b2");
        assert_eq!(frame_type_name("hlt_main"), "__frame_hlt_main");
    }

    #[test]
    fn globals() {
        assert_eq!(global_name("Main", "counter"), "hlt_Main_counter");
    }

    proptest! {
        #[test]
        fn distinct_labels_get_distinct_block_functions(
            a in "[a-z][a-z0-9_]{0,8}",
            b in "[a-z][a-z0-9_]{0,8}",
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(
                block_function_name("hlt_f", &a),
                block_function_name("hlt_f", &b)
            );
        }

        #[test]
        fn hilti_names_never_contain_separators(
            parts in prop::collection::vec("[A-Za-z][A-Za-z0-9]{0,6}", 1..4),
        ) {
            let name = function_name(&parts.join("::"), CallingConvention::Hilti);
            prop_assert!(name.starts_with(HILTI_PREFIX));
            prop_assert!(!name.contains(':'));
        }
    }
}
