use domain::Todo;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

/// 一覧画面の絞り込み条件（すべて AND）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilter {
    pub status: StatusFilter,
    pub category: CategoryFilter,
    /// タイトルまたは説明に対する大文字小文字を区別しない部分一致
    pub search: String,
}

impl TodoFilter {
    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = CategoryFilter::Only(category.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn matches(&self, todo: &Todo) -> bool {
        let status = match self.status {
            StatusFilter::All => true,
            StatusFilter::Active => !todo.completed,
            StatusFilter::Completed => todo.completed,
        };
        let category = match &self.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => todo.category.as_str() == category,
        };
        let needle = self.search.to_lowercase();
        let search = todo.title.to_lowercase().contains(&needle)
            || todo.description.to_lowercase().contains(&needle);

        status && category && search
    }
}

pub fn filtered<'a>(todos: &'a [Todo], filter: &TodoFilter) -> Vec<&'a Todo> {
    todos.iter().filter(|todo| filter.matches(todo)).collect()
}

pub fn completed_count(todos: &[Todo]) -> usize {
    todos.iter().filter(|todo| todo.completed).count()
}

/// 完了率（0〜100）。空なら 0
pub fn completion_percentage(todos: &[Todo]) -> f64 {
    if todos.is_empty() {
        return 0.0;
    }
    completed_count(todos) as f64 / todos.len() as f64 * 100.0
}

/// カテゴリごとに分ける。カテゴリの出現順とグループ内の順序を保つ
pub fn by_category(todos: &[Todo]) -> Vec<(String, Vec<&Todo>)> {
    let mut groups: Vec<(String, Vec<&Todo>)> = Vec::new();
    for todo in todos {
        match groups
            .iter_mut()
            .find(|(category, _)| category == todo.category.as_str())
        {
            Some((_, group)) => group.push(todo),
            None => groups.push((todo.category.to_string(), vec![todo])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{NewTodo, TodoPatch, UserId};

    fn todo(title: &str, description: &str, category: &str, completed: bool) -> Todo {
        let mut todo = Todo::create(
            UserId::from_string("u1".to_string()).unwrap(),
            NewTodo::new(title)
                .with_description(description)
                .with_category(category),
            Utc::now(),
        )
        .unwrap();
        todo.apply(TodoPatch::completed(completed), Utc::now()).unwrap();
        todo
    }

    fn sample() -> Vec<Todo> {
        vec![
            todo("Buy milk", "2 litres", "personal", false),
            todo("Write report", "quarterly Numbers", "work", true),
            todo("Run", "", "health", false),
            todo("Call mom", "", "personal", true),
        ]
    }

    fn titles(todos: Vec<&Todo>) -> Vec<&str> {
        todos.into_iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        let todos = sample();
        assert_eq!(filtered(&todos, &TodoFilter::default()).len(), 4);
    }

    #[test]
    fn test_filters_are_combined() {
        let todos = sample();
        let filter = TodoFilter::default()
            .with_status(StatusFilter::Completed)
            .with_category("personal");

        assert_eq!(titles(filtered(&todos, &filter)), vec!["Call mom"]);
    }

    #[test]
    fn test_search_is_case_insensitive_on_title_or_description() {
        let todos = sample();

        let by_description = TodoFilter::default().with_search("NUMBERS");
        assert_eq!(titles(filtered(&todos, &by_description)), vec!["Write report"]);

        let by_title = TodoFilter::default()
            .with_status(StatusFilter::Active)
            .with_search("milk");
        assert_eq!(titles(filtered(&todos, &by_title)), vec!["Buy milk"]);
    }

    #[test]
    fn test_completion_percentage() {
        assert_eq!(completion_percentage(&[]), 0.0);
        assert_eq!(completion_percentage(&sample()), 50.0);
        assert_eq!(completed_count(&sample()), 2);
    }

    #[test]
    fn test_by_category_preserves_encounter_order() {
        let todos = sample();
        let groups = by_category(&todos);

        let names: Vec<&str> = groups.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(names, vec!["personal", "work", "health"]);
        assert_eq!(titles(groups[0].1.clone()), vec!["Buy milk", "Call mom"]);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;
        use proptest::prelude::prop;

        fn todos_strategy() -> impl Strategy<Value = Vec<Todo>> {
            prop::collection::vec(
                ("[a-z]{1,8}", prop::sample::select(vec!["personal", "work", "health"]), any::<bool>()),
                0..20,
            )
            .prop_map(|rows| {
                rows.into_iter()
                    .map(|(title, category, completed)| todo(&title, "", category, completed))
                    .collect()
            })
        }

        proptest! {
            #[test]
            fn percentage_is_within_bounds(todos in todos_strategy()) {
                let pct = completion_percentage(&todos);
                prop_assert!((0.0..=100.0).contains(&pct));
                if !todos.is_empty() && todos.iter().all(|t| t.completed) {
                    prop_assert_eq!(pct, 100.0);
                }
            }

            #[test]
            fn status_filters_partition_the_list(todos in todos_strategy()) {
                let active = filtered(&todos, &TodoFilter::default().with_status(StatusFilter::Active)).len();
                let done = filtered(&todos, &TodoFilter::default().with_status(StatusFilter::Completed)).len();
                prop_assert_eq!(active + done, todos.len());
                prop_assert_eq!(done, completed_count(&todos));
            }

            #[test]
            fn grouping_keeps_every_record(todos in todos_strategy()) {
                let grouped: usize = by_category(&todos).iter().map(|(_, g)| g.len()).sum();
                prop_assert_eq!(grouped, todos.len());
            }
        }
    }
}
