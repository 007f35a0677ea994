//! Builds the canonical file/suite/function tree from raw identifiers.
//!
//! Nodes live in flat, first-seen-ordered collections and reference
//! each other by identity key, so deduplication and the flat-count
//! invariants fall out of construction and re-discovery can replace
//! whole trees without chasing parent/child references.

use crate::types::{
    file_key, function_key, suite_key, DiscoveredTests, RawTestId, TestFile, TestFunction,
    TestSuite,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Build a [`DiscoveredTests`] tree from parsed identifiers.
///
/// Suites are created lazily at the first identifier mentioning their
/// path, so the result is identical regardless of input order; an
/// identity key appearing twice collapses to one entity.
pub fn build(raw_ids: &[RawTestId], root: &Path) -> DiscoveredTests {
    Builder::new(root).build(raw_ids)
}

struct Builder<'a> {
    root: &'a Path,
    tests: DiscoveredTests,
    file_index: HashMap<String, usize>,
    suite_index: HashMap<String, usize>,
    seen_functions: HashSet<String>,
}

impl<'a> Builder<'a> {
    fn new(root: &'a Path) -> Self {
        Self {
            root,
            tests: DiscoveredTests::default(),
            file_index: HashMap::new(),
            suite_index: HashMap::new(),
            seen_functions: HashSet::new(),
        }
    }

    fn build(mut self, raw_ids: &[RawTestId]) -> DiscoveredTests {
        for raw in raw_ids {
            self.insert(raw);
        }
        self.tests
    }

    fn insert(&mut self, raw: &RawTestId) {
        let fkey = file_key(&raw.file);
        if fkey.is_empty() {
            return;
        }
        let function_key = function_key(&fkey, &raw.suites, &raw.function);
        if !self.seen_functions.insert(function_key.clone()) {
            return;
        }

        let file_idx = self.file_entry(&fkey, &raw.file);
        let suite_idx = self.suite_chain(&fkey, file_idx, &raw.suites);

        let qualified_name = if raw.suites.is_empty() {
            raw.function.clone()
        } else {
            format!("{}.{}", raw.suites.join("."), raw.function)
        };

        self.tests.test_functions.push(TestFunction {
            key: function_key.clone(),
            name: raw.function.clone(),
            qualified_name,
            file: raw.file.clone(),
            suite_key: suite_idx.map(|i| self.tests.test_suites[i].key.clone()),
            line: raw.line,
        });

        match suite_idx {
            Some(i) => self.tests.test_suites[i].function_keys.push(function_key),
            None => self.tests.test_files[file_idx].function_keys.push(function_key),
        }
    }

    fn file_entry(&mut self, key: &str, relative: &Path) -> usize {
        if let Some(&idx) = self.file_index.get(key) {
            return idx;
        }
        let idx = self.tests.test_files.len();
        self.tests.test_files.push(TestFile {
            key: key.to_string(),
            relative_path: relative.to_path_buf(),
            absolute_path: self.root.join(relative),
            suite_keys: Vec::new(),
            function_keys: Vec::new(),
        });
        self.file_index.insert(key.to_string(), idx);
        idx
    }

    /// Create every suite prefix along the path at most once, linking
    /// each new suite to its parent (or the file, at depth one).
    fn suite_chain(&mut self, fkey: &str, file_idx: usize, suites: &[String]) -> Option<usize> {
        let mut current: Option<usize> = None;
        for depth in 1..=suites.len() {
            let prefix = &suites[..depth];
            let key = suite_key(fkey, prefix);
            if let Some(&idx) = self.suite_index.get(&key) {
                current = Some(idx);
                continue;
            }

            let idx = self.tests.test_suites.len();
            self.tests.test_suites.push(TestSuite {
                key: key.clone(),
                name: prefix[depth - 1].clone(),
                qualified_name: prefix.join("."),
                file: self.tests.test_files[file_idx].relative_path.clone(),
                parent_key: current.map(|i| self.tests.test_suites[i].key.clone()),
                suite_keys: Vec::new(),
                function_keys: Vec::new(),
            });
            match current {
                Some(parent) => self.tests.test_suites[parent].suite_keys.push(key.clone()),
                None => self.tests.test_files[file_idx].suite_keys.push(key.clone()),
            }
            self.suite_index.insert(key, idx);
            current = Some(idx);
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn raw(file: &str, suites: &[&str], function: &str) -> RawTestId {
        RawTestId::new(
            file,
            suites.iter().map(|s| s.to_string()).collect(),
            function,
        )
    }

    fn traversal_counts(tests: &DiscoveredTests) -> (usize, usize) {
        // Counts reached by walking files, for comparison with the
        // flat collections.
        let mut suites = 0;
        let mut functions = 0;
        for file in &tests.test_files {
            functions += file.function_keys.len();
            let mut pending: Vec<&str> = file.suite_keys.iter().map(|k| k.as_str()).collect();
            while let Some(key) = pending.pop() {
                let suite = tests.suite(key).expect("suite key must resolve");
                suites += 1;
                functions += suite.function_keys.len();
                pending.extend(suite.suite_keys.iter().map(|k| k.as_str()));
            }
        }
        (suites, functions)
    }

    #[test]
    fn test_groups_by_file_and_suite() {
        let ids = vec![
            raw("tests/test_one.py", &["TestOne"], "test_a"),
            raw("tests/test_one.py", &["TestOne"], "test_b"),
            raw("tests/test_two.py", &[], "test_standalone"),
        ];
        let tests = build(&ids, Path::new("/work"));

        assert_eq!(tests.test_files.len(), 2);
        assert_eq!(tests.test_suites.len(), 1);
        assert_eq!(tests.test_functions.len(), 3);

        let suite = tests.suite("tests/test_one.py::TestOne").unwrap();
        assert_eq!(suite.function_keys.len(), 2);
        assert_eq!(suite.file, PathBuf::from("tests/test_one.py"));

        let file = tests.file("tests/test_two.py").unwrap();
        assert_eq!(file.function_keys, vec!["tests/test_two.py::test_standalone"]);
        assert_eq!(file.absolute_path, PathBuf::from("/work/tests/test_two.py"));
    }

    #[test]
    fn test_duplicate_identity_collapses_to_one_entity() {
        let ids = vec![
            raw("t.py", &["T"], "test_a"),
            raw("t.py", &["T"], "test_a"),
        ];
        let tests = build(&ids, Path::new("."));
        assert_eq!(tests.test_functions.len(), 1);
        assert_eq!(tests.test_suites.len(), 1);
    }

    #[test]
    fn test_nested_suites_link_parent_and_child() {
        let ids = vec![raw("t.py", &["Outer", "Inner"], "test_x")];
        let tests = build(&ids, Path::new("."));

        assert_eq!(tests.test_suites.len(), 2);
        let outer = tests.suite("t.py::Outer").unwrap();
        let inner = tests.suite("t.py::Outer::Inner").unwrap();
        assert_eq!(outer.parent_key, None);
        assert_eq!(inner.parent_key.as_deref(), Some("t.py::Outer"));
        assert_eq!(outer.suite_keys, vec!["t.py::Outer::Inner"]);

        let file = tests.file("t.py").unwrap();
        assert_eq!(file.suite_keys, vec!["t.py::Outer"]);

        let function = tests.function("t.py::Outer::Inner::test_x").unwrap();
        assert_eq!(function.qualified_name, "Outer.Inner.test_x");
        assert_eq!(function.suite_key.as_deref(), Some("t.py::Outer::Inner"));
    }

    #[test]
    fn test_result_is_order_independent() {
        let forward = vec![
            raw("a.py", &["A"], "test_1"),
            raw("a.py", &["A"], "test_2"),
            raw("b.py", &[], "test_3"),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let first = build(&forward, Path::new("."));
        let second = build(&reversed, Path::new("."));

        let keys_a: HashSet<&str> = first.function_keys().collect();
        let keys_b: HashSet<&str> = second.function_keys().collect();
        assert_eq!(keys_a, keys_b);
        assert_eq!(first.test_suites.len(), second.test_suites.len());
        assert_eq!(first.test_files.len(), second.test_files.len());
    }

    #[test]
    fn test_children_preserve_first_seen_order() {
        let ids = vec![
            raw("t.py", &["T"], "test_c"),
            raw("t.py", &["T"], "test_a"),
            raw("t.py", &["T"], "test_b"),
        ];
        let tests = build(&ids, Path::new("."));
        let suite = tests.suite("t.py::T").unwrap();
        assert_eq!(
            suite.function_keys,
            vec!["t.py::T::test_c", "t.py::T::test_a", "t.py::T::test_b"]
        );
    }

    #[test]
    fn test_flat_counts_equal_traversal_counts() {
        let ids = vec![
            raw("a.py", &["A"], "test_1"),
            raw("a.py", &["A", "Nested"], "test_2"),
            raw("a.py", &[], "test_3"),
            raw("b.py", &["B"], "test_4"),
        ];
        let tests = build(&ids, Path::new("."));
        let (suites, functions) = traversal_counts(&tests);
        assert_eq!(suites, tests.test_suites.len());
        assert_eq!(functions, tests.test_functions.len());
    }
}
