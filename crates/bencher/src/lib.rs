/// A path to route against a route table of a given size.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    path: &'static str,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, path: &'static str) -> Self {
        Self { name, group, path }
    }

    pub fn small(name: &'static str, path: &'static str) -> Self {
        Self::new(name, TestGroup::Small, path)
    }

    pub fn normal(name: &'static str, path: &'static str) -> Self {
        Self::new(name, TestGroup::Normal, path)
    }

    pub fn large(name: &'static str, path: &'static str) -> Self {
        Self::new(name, TestGroup::Large, path)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn path(&self) -> &'static str {
        self.path
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}

impl TestGroup {
    /// Number of routes declared in front of the catch all route.
    pub fn route_count(self) -> usize {
        match self {
            TestGroup::Small => 8,
            TestGroup::Normal => 64,
            TestGroup::Large => 512,
        }
    }
}

/// Parametric patterns `/api/resource{i}/:id/items/:item` for `i` in `0..count`.
pub fn route_patterns(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("/api/resource{i}/:id/items/:item")).collect()
}
