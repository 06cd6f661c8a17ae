//! Python builtins and keywords offered after the buffer's own names.

/// A builtin name with its call signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Builtin {
    pub name: &'static str,
    /// `function` or `class`.
    pub type_name: &'static str,
    pub signature: &'static str,
    pub doc: &'static str,
}

/// Commonly used builtins, most frequent first.
pub static BUILTINS: &[Builtin] = &[
    Builtin {
        name: "print",
        type_name: "function",
        signature: "print(*values, sep=' ', end='\\n', file=None, flush=False)",
        doc: "Print values to a stream, or to sys.stdout by default.",
    },
    Builtin {
        name: "len",
        type_name: "function",
        signature: "len(obj, /)",
        doc: "Return the number of items in a container.",
    },
    Builtin {
        name: "range",
        type_name: "class",
        signature: "range(start, stop, step=1)",
        doc: "Immutable sequence of integers from start to stop by step.",
    },
    Builtin {
        name: "str",
        type_name: "class",
        signature: "str(object='')",
        doc: "Create a new string object from the given object.",
    },
    Builtin {
        name: "int",
        type_name: "class",
        signature: "int(x=0, base=10)",
        doc: "Convert a number or string to an integer.",
    },
    Builtin {
        name: "float",
        type_name: "class",
        signature: "float(x=0.0)",
        doc: "Convert a string or number to a floating point number.",
    },
    Builtin {
        name: "bool",
        type_name: "class",
        signature: "bool(x=False)",
        doc: "Return True when the argument is true, False otherwise.",
    },
    Builtin {
        name: "list",
        type_name: "class",
        signature: "list(iterable=())",
        doc: "Built-in mutable sequence.",
    },
    Builtin {
        name: "dict",
        type_name: "class",
        signature: "dict(**kwargs)",
        doc: "Mapping of keys to values.",
    },
    Builtin {
        name: "set",
        type_name: "class",
        signature: "set(iterable=())",
        doc: "Unordered collection of unique elements.",
    },
    Builtin {
        name: "tuple",
        type_name: "class",
        signature: "tuple(iterable=())",
        doc: "Built-in immutable sequence.",
    },
    Builtin {
        name: "open",
        type_name: "function",
        signature: "open(file, mode='r', buffering=-1, encoding=None, errors=None, newline=None)",
        doc: "Open file and return a stream.",
    },
    Builtin {
        name: "enumerate",
        type_name: "class",
        signature: "enumerate(iterable, start=0)",
        doc: "Yield pairs of a count and a value from the iterable.",
    },
    Builtin {
        name: "zip",
        type_name: "class",
        signature: "zip(*iterables, strict=False)",
        doc: "Yield tuples until an input is exhausted.",
    },
    Builtin {
        name: "sorted",
        type_name: "function",
        signature: "sorted(iterable, /, *, key=None, reverse=False)",
        doc: "Return a new list containing all items from the iterable in ascending order.",
    },
    Builtin {
        name: "isinstance",
        type_name: "function",
        signature: "isinstance(obj, class_or_tuple, /)",
        doc: "Return whether an object is an instance of a class or of a subclass thereof.",
    },
    Builtin {
        name: "getattr",
        type_name: "function",
        signature: "getattr(object, name, default=None)",
        doc: "Get a named attribute from an object.",
    },
    Builtin {
        name: "hasattr",
        type_name: "function",
        signature: "hasattr(obj, name, /)",
        doc: "Return whether the object has an attribute with the given name.",
    },
    Builtin {
        name: "min",
        type_name: "function",
        signature: "min(iterable, *, key=None)",
        doc: "Return the smallest item.",
    },
    Builtin {
        name: "max",
        type_name: "function",
        signature: "max(iterable, *, key=None)",
        doc: "Return the largest item.",
    },
    Builtin {
        name: "sum",
        type_name: "function",
        signature: "sum(iterable, /, start=0)",
        doc: "Return the sum of a start value plus an iterable of numbers.",
    },
    Builtin {
        name: "abs",
        type_name: "function",
        signature: "abs(x, /)",
        doc: "Return the absolute value of the argument.",
    },
    Builtin {
        name: "any",
        type_name: "function",
        signature: "any(iterable, /)",
        doc: "Return True if any element of the iterable is true.",
    },
    Builtin {
        name: "all",
        type_name: "function",
        signature: "all(iterable, /)",
        doc: "Return True if every element of the iterable is true.",
    },
    Builtin {
        name: "map",
        type_name: "class",
        signature: "map(func, *iterables)",
        doc: "Apply func to every item of the iterables.",
    },
    Builtin {
        name: "filter",
        type_name: "class",
        signature: "filter(function, iterable)",
        doc: "Yield items of iterable for which function(item) is true.",
    },
    Builtin {
        name: "type",
        type_name: "class",
        signature: "type(object)",
        doc: "Return the type of an object.",
    },
    Builtin {
        name: "super",
        type_name: "class",
        signature: "super(type, object_or_type=None)",
        doc: "Proxy that delegates method calls to a parent or sibling class.",
    },
    Builtin {
        name: "repr",
        type_name: "function",
        signature: "repr(obj, /)",
        doc: "Return the canonical string representation of the object.",
    },
    Builtin {
        name: "round",
        type_name: "function",
        signature: "round(number, ndigits=None)",
        doc: "Round a number to a given precision in decimal digits.",
    },
    Builtin {
        name: "Exception",
        type_name: "class",
        signature: "Exception(*args)",
        doc: "Common base class for all non-exit exceptions.",
    },
    Builtin {
        name: "ValueError",
        type_name: "class",
        signature: "ValueError(*args)",
        doc: "Inappropriate argument value (of correct type).",
    },
    Builtin {
        name: "TypeError",
        type_name: "class",
        signature: "TypeError(*args)",
        doc: "Inappropriate argument type.",
    },
    Builtin {
        name: "KeyError",
        type_name: "class",
        signature: "KeyError(*args)",
        doc: "Mapping key not found.",
    },
];

pub static KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

pub fn builtin(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_unique() {
        let mut names: Vec<&str> = BUILTINS.iter().map(|b| b.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BUILTINS.len());
    }

    #[test]
    fn signatures_start_with_name() {
        for b in BUILTINS {
            assert!(b.signature.starts_with(&format!("{}(", b.name)), "{}", b.name);
        }
    }

    #[test]
    fn builtin_lookup() {
        assert_eq!(builtin("len").map(|b| b.type_name), Some("function"));
        assert!(builtin("nope").is_none());
        assert!(KEYWORDS.contains(&"lambda"));
    }
}
