use crate::lang::Lang;
use tree_sitter::Node;

/// File complexity: 1 plus every branching construct and every function
/// declaration anywhere in the tree.
#[must_use]
pub fn calculate(root: Node, lang: Lang) -> usize {
    let branches = lang.branch_kinds();
    let functions = lang.function_kinds();
    let else_field = lang.else_field_kind();

    let mut complexity = 1;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let kind = node.kind();
        if branches.contains(&kind) || functions.contains(&kind) {
            complexity += 1;
        }
        if else_field == Some(kind) && node.child_by_field_name("alternative").is_some() {
            complexity += 1;
        }
        let mut cursor = node.walk();
        stack.extend(node.named_children(&mut cursor));
    }
    complexity
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tree_sitter::Parser;

    fn complexity_of(file: &str, source: &str) -> usize {
        let path = Path::new(file);
        let lang = Lang::from_path(path).unwrap();
        let mut parser = Parser::new();
        parser
            .set_language(crate::lang::grammar_for(path).unwrap())
            .unwrap();
        let tree = parser.parse(source, None).unwrap();
        calculate(tree.root_node(), lang)
    }

    #[test]
    fn straight_line_code_is_one() {
        assert_eq!(complexity_of("a.ts", "const a = 1;\nconsole.log(a);\n"), 1);
        assert_eq!(complexity_of("a.py", "x = 1\nprint(x)\n"), 1);
        assert_eq!(complexity_of("a.rs", "const A: u8 = 1;\n"), 1);
    }

    #[test]
    fn nested_ifs_in_one_function() {
        let src = r"
function check(a, b, c) {
  if (a) {
    if (b) {
      if (c) {
        return 1;
      }
    }
  }
  return 0;
}
";
        assert_eq!(complexity_of("check.ts", src), 5);
    }

    #[test]
    fn counts_are_additive_over_the_whole_tree() {
        let src = r"
def outer(items):
    for item in items:
        try:
            handle(item)
        except ValueError:
            pass
    return [x for x in items] if items else []

class Box:
    def get(self):
        while True:
            break
";
        // base 1 + 2 functions + for + try + except + conditional + while
        assert_eq!(complexity_of("a.py", src), 8);
    }

    #[test]
    fn rust_match_arms_and_else_count() {
        let src = r"
fn pick(x: Option<u8>) -> u8 {
    match x {
        Some(v) => v,
        None => 0,
    }
}
fn flag(b: bool) -> u8 {
    if b { 1 } else { 0 }
}
";
        // base 1 + 2 fns + match + 2 arms + if + else
        assert_eq!(complexity_of("lib.rs", src), 8);
    }

    #[test]
    fn go_else_counts_like_other_languages() {
        let go = r"
package main

func flag(b bool) int {
	if b {
		return 1
	} else {
		return 0
	}
}
";
        let ts = "function flag(b) {\n  if (b) {\n    return 1;\n  } else {\n    return 0;\n  }\n}\n";
        // base 1 + fn + if + else
        assert_eq!(complexity_of("flag.go", go), 4);
        assert_eq!(complexity_of("flag.go", go), complexity_of("flag.ts", ts));
    }

    #[test]
    fn go_if_without_else_adds_one() {
        let go = "package main\n\nfunc f(b bool) int {\n\tif b {\n\t\treturn 1\n\t}\n\treturn 0\n}\n";
        assert_eq!(complexity_of("f.go", go), 3);
    }
}
