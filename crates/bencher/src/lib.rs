#[derive(Debug, Copy, Clone)]
pub struct RequestCase {
    name: &'static str,
    group: CaseGroup,
    path: &'static str,
}

impl RequestCase {
    pub fn new(name: &'static str, group: CaseGroup, path: &'static str) -> Self {
        Self { name, group, path }
    }

    pub fn flat(name: &'static str, path: &'static str) -> Self {
        Self::new(name, CaseGroup::Flat, path)
    }

    pub fn nested(name: &'static str, path: &'static str) -> Self {
        Self::new(name, CaseGroup::Nested, path)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> CaseGroup {
        self.group
    }

    pub fn path(&self) -> &'static str {
        self.path
    }
}

#[derive(Clone, Copy, Debug)]
pub enum CaseGroup {
    Flat,
    Nested,
}
