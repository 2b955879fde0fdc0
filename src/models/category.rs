#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: Option<i64>,
    /// `None` for categories shared by every user.
    pub user_id: Option<i64>,
    pub name: String,
}

impl Category {
    pub fn new(name: String) -> Self {
        Self {
            id: None,
            user_id: None,
            name,
        }
    }

    pub fn owned_by(name: String, user_id: i64) -> Self {
        Self {
            id: None,
            user_id: Some(user_id),
            name,
        }
    }

    /// Find a category by ID in a slice.
    pub fn find_by_id(categories: &[Category], id: i64) -> Option<&Category> {
        categories.iter().find(|c| c.id == Some(id))
    }

    pub fn is_shared(&self) -> bool {
        self.user_id.is_none()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
