use std::collections::HashMap;

/// A route table mapping path templates + methods to values of type `T`.
#[derive(Debug)]
pub struct Router<T> {
    root: Node<T>,
    len: usize,
}

#[derive(Debug)]
struct Node<T> {
    literals: HashMap<String, Node<T>>,
    /// Single-segment capture, at most one per node.
    capture: Option<Box<Capture<T>>>,
    /// Greedy capture (`{name+}`), terminal only.
    rest: Option<Box<Capture<T>>>,
    methods: HashMap<String, T>,
}

#[derive(Debug)]
struct Capture<T> {
    name: String,
    node: Node<T>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            literals: HashMap::new(),
            capture: None,
            rest: None,
            methods: HashMap::new(),
        }
    }
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self {
            root: Node::default(),
            len: 0,
        }
    }
}

/// The outcome of matching a request against the table.
#[derive(Debug, PartialEq, Eq)]
pub enum RouteMatch<'a, T> {
    /// Path and method both matched.
    Found {
        value: &'a T,
        params: Vec<(String, String)>,
    },
    /// The path exists but not for this method.
    MethodNotAllowed { allowed: Vec<String> },
    /// Nothing matched the path.
    NotFound,
}

impl<T> RouteMatch<'_, T> {
    /// True for `Found`.
    pub fn is_found(&self) -> bool {
        matches!(self, RouteMatch::Found { .. })
    }
}

enum Segment<'a> {
    Literal(&'a str),
    Capture(&'a str),
    Rest(&'a str),
}

impl<T> Router<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` for a path template and method.
    ///
    /// Re-registering the same template and method replaces the old value.
    pub fn insert(&mut self, template: &str, method: &str, value: T) {
        let mut node = &mut self.root;
        for segment in parse_template(template) {
            node = match segment {
                Segment::Literal(name) => node.literals.entry(name.to_string()).or_default(),
                Segment::Capture(name) => {
                    &mut node
                        .capture
                        .get_or_insert_with(|| Box::new(Capture::named(name)))
                        .node
                }
                Segment::Rest(name) => {
                    &mut node
                        .rest
                        .get_or_insert_with(|| Box::new(Capture::named(name)))
                        .node
                }
            };
        }

        if node
            .methods
            .insert(method.to_ascii_uppercase(), value)
            .is_none()
        {
            self.len += 1;
        }
    }

    /// Match a concrete request path and method.
    pub fn lookup(&self, path: &str, method: &str) -> RouteMatch<'_, T> {
        let normalized = normalize_path(path);
        let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();

        let mut params = Vec::new();
        let Some(node) = descend(&self.root, &segments, &mut params) else {
            return RouteMatch::NotFound;
        };

        if let Some(value) = node.methods.get(&method.to_ascii_uppercase()) {
            return RouteMatch::Found { value, params };
        }
        if node.methods.is_empty() {
            return RouteMatch::NotFound;
        }

        let mut allowed: Vec<String> = node.methods.keys().cloned().collect();
        allowed.sort();
        RouteMatch::MethodNotAllowed { allowed }
    }

    /// Number of registered (template, method) pairs.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T> Capture<T> {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            node: Node::default(),
        }
    }
}

/// Walk the trie for `segments`, literals first, then the single capture,
/// then the greedy capture. Captured values are pushed onto `params` and
/// popped again on backtrack.
fn descend<'t, T>(
    node: &'t Node<T>,
    segments: &[&str],
    params: &mut Vec<(String, String)>,
) -> Option<&'t Node<T>> {
    let Some((&head, tail)) = segments.split_first() else {
        return Some(node);
    };

    if let Some(found) = node
        .literals
        .get(head)
        .and_then(|child| descend(child, tail, params))
    {
        return Some(found);
    }

    if let Some(capture) = &node.capture {
        let mark = params.len();
        params.push((capture.name.clone(), head.to_string()));
        if let Some(found) = descend(&capture.node, tail, params) {
            return Some(found);
        }
        params.truncate(mark);
    }

    if let Some(rest) = &node.rest {
        if !rest.node.methods.is_empty() {
            params.push((rest.name.clone(), segments.join("/")));
            return Some(&rest.node);
        }
    }

    None
}

fn parse_template(template: &str) -> impl Iterator<Item = Segment<'_>> {
    template.split('/').filter(|s| !s.is_empty()).map(|s| {
        match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(inner) => match inner.strip_suffix('+') {
                Some(name) => Segment::Rest(name),
                None => Segment::Capture(inner),
            },
            None => Segment::Literal(s),
        }
    })
}

/// Collapse repeated slashes and drop a trailing slash (root stays `/`).
pub fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 1);
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        normalized.push('/');
        normalized.push_str(segment);
    }

    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}
