#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    headers: TestHeaders,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, headers: TestHeaders) -> Self {
        Self { name, group, headers }
    }

    pub fn small(name: &'static str, headers: TestHeaders) -> Self {
        Self::new(name, TestGroup::Small, headers)
    }

    pub fn normal(name: &'static str, headers: TestHeaders) -> Self {
        Self::new(name, TestGroup::Normal, headers)
    }

    pub fn large(name: &'static str, headers: TestHeaders) -> Self {
        Self::new(name, TestGroup::Large, headers)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn headers(&self) -> &TestHeaders {
        &self.headers
    }
}

/// The negotiation headers of one sample request.
#[derive(Debug, Copy, Clone)]
pub struct TestHeaders {
    accept: &'static str,
    accept_language: &'static str,
}

impl TestHeaders {
    pub const fn new(accept: &'static str, accept_language: &'static str) -> Self {
        Self { accept, accept_language }
    }

    pub fn accept(&self) -> &'static str {
        self.accept
    }

    pub fn accept_language(&self) -> &'static str {
        self.accept_language
    }

    pub fn len(&self) -> usize {
        self.accept.len() + self.accept_language.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}
