//! Function diff. Postgres functions can only ever be created, replaced, or dropped — there
//! is no `ALTER FUNCTION ... body`, so every persisted-and-changed function becomes a single
//! `CREATE OR REPLACE`.

use crate::model::function::is_untracked_language;
use crate::model::Function;
use crate::ops::Op;

pub fn diff(old: Option<&Function>, new: Option<&Function>) -> Vec<Op> {
    match (old, new) {
        (None, Some(new_fn)) => vec![Op::CreateFunction {
            function: new_fn.clone(),
            replace: false,
        }],

        (Some(old_fn), None) => vec![Op::DropFunction {
            escaped_name: old_fn.escaped_name.clone(),
        }],

        (Some(old_fn), Some(new_fn)) => {
            // Untracked-language functions (anything but plain SQL) may hide dependency
            // changes the differ can't see, so a replace is always emitted for them even
            // when the stored definition text happens to be identical to the old one.
            let changed = old_fn.definition != new_fn.definition
                || old_fn.language != new_fn.language
                || is_untracked_language(&new_fn.language);

            if changed {
                vec![Op::CreateFunction {
                    function: new_fn.clone(),
                    replace: true,
                }]
            } else {
                vec![]
            }
        }

        (None, None) => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn make_fn(name: &str, language: &str, body: &str) -> Function {
        Function {
            escaped_name: format!("\"public\".\"{name}\"()"),
            definition: format!(
                "CREATE OR REPLACE FUNCTION public.{name}() RETURNS trigger LANGUAGE {language} AS $${body}$$"
            ),
            language: language.to_string(),
            depends_on_functions: BTreeSet::new(),
        }
    }

    #[test]
    fn identical_sql_function_emits_nothing() {
        let f = make_fn("touch", "sql", "select 1");
        assert!(diff(Some(&f), Some(&f)).is_empty());
    }

    #[test]
    fn changed_definition_emits_create_or_replace() {
        let old = make_fn("touch", "sql", "select 1");
        let new = make_fn("touch", "sql", "select 2");
        let ops = diff(Some(&old), Some(&new));
        assert_eq!(
            ops,
            vec![Op::CreateFunction { function: new, replace: true }]
        );
    }

    #[test]
    fn untracked_language_always_emits_even_with_identical_body() {
        let f = make_fn("touch", "plpgsql", "begin return new; end");
        let ops = diff(Some(&f), Some(&f));
        assert_eq!(ops, vec![Op::CreateFunction { function: f, replace: true }]);
    }

    #[test]
    fn new_function_emits_create() {
        let f = make_fn("touch", "sql", "select 1");
        assert_eq!(
            diff(None, Some(&f)),
            vec![Op::CreateFunction { function: f, replace: false }]
        );
    }

    #[test]
    fn dropped_function_emits_drop_by_escaped_name() {
        let f = make_fn("touch", "sql", "select 1");
        assert_eq!(
            diff(Some(&f), None),
            vec![Op::DropFunction { escaped_name: f.escaped_name }]
        );
    }
}
