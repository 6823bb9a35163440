use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, SecondsFormat, Utc};
use domain::{Category, Todo, TodoId, TodoPatch, User, UserId};
use std::collections::HashMap;

/// 所有者で ToDo を引くためのグローバルセカンダリインデックス
pub const GSI1: &str = "GSI1";

pub type Item = HashMap<String, AttributeValue>;

/// DynamoDB アイテムのエンティティタイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Todo,
    User,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Todo => "Todo",
            EntityType::User => "User",
        }
    }
}

/// Single Table Design のキー構造
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoDbKeys {
    pub pk: String,
    pub sk: String,
    pub gsi1_pk: Option<String>,
    pub gsi1_sk: Option<String>,
}

impl DynamoDbKeys {
    /// ToDo 本体のキー（ID だけで取得できるようにする）
    pub fn for_todo(todo_id: &TodoId) -> Self {
        Self {
            pk: format!("TODO#{}", todo_id.as_str()),
            sk: "TODO".to_string(),
            gsi1_pk: None,
            gsi1_sk: None,
        }
    }

    /// 所有者インデックス付きの ToDo キー。GSI1SK は作成日時順に並ぶ
    pub fn for_owned_todo(todo: &Todo) -> Self {
        Self {
            gsi1_pk: Some(Self::owner_partition(&todo.owner)),
            gsi1_sk: Some(format!(
                "{}#{}",
                format_timestamp(&todo.created_at),
                todo.id.as_str()
            )),
            ..Self::for_todo(&todo.id)
        }
    }

    pub fn owner_partition(owner: &UserId) -> String {
        format!("OWNER#{}", owner.as_str())
    }

    /// ユーザーのキー（正規化済みメールアドレスで一意）
    pub fn for_user(email: &str) -> Self {
        Self {
            pk: format!("EMAIL#{email}"),
            sk: "USER".to_string(),
            gsi1_pk: None,
            gsi1_sk: None,
        }
    }

    pub fn primary_key(&self) -> Item {
        HashMap::from([
            ("PK".to_string(), AttributeValue::S(self.pk.clone())),
            ("SK".to_string(), AttributeValue::S(self.sk.clone())),
        ])
    }

    fn write_into(&self, item: &mut Item) {
        item.extend(self.primary_key());
        if let Some(gsi1_pk) = &self.gsi1_pk {
            item.insert("GSI1PK".to_string(), AttributeValue::S(gsi1_pk.clone()));
        }
        if let Some(gsi1_sk) = &self.gsi1_sk {
            item.insert("GSI1SK".to_string(), AttributeValue::S(gsi1_sk.clone()));
        }
    }
}

/// ナノ秒まで固定幅の RFC3339（辞書順 = 時系列順、往復で値が変わらない）
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn get_s<'a>(item: &'a Item, key: &str) -> Result<&'a String, String> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| format!("Missing {key}"))
}

fn get_timestamp(item: &Item, key: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(get_s(item, key)?).ok_or_else(|| format!("Invalid {key}"))
}

pub fn todo_to_item(todo: &Todo) -> Item {
    let mut item = HashMap::new();
    DynamoDbKeys::for_owned_todo(todo).write_into(&mut item);

    item.insert(
        "EntityType".to_string(),
        AttributeValue::S(EntityType::Todo.as_str().to_string()),
    );
    item.insert("Id".to_string(), AttributeValue::S(todo.id.to_string()));
    item.insert("Owner".to_string(), AttributeValue::S(todo.owner.to_string()));
    item.insert("Title".to_string(), AttributeValue::S(todo.title.clone()));
    item.insert(
        "Description".to_string(),
        AttributeValue::S(todo.description.clone()),
    );
    item.insert(
        "Category".to_string(),
        AttributeValue::S(todo.category.to_string()),
    );
    item.insert("Completed".to_string(), AttributeValue::Bool(todo.completed));
    item.insert(
        "CreatedAt".to_string(),
        AttributeValue::S(format_timestamp(&todo.created_at)),
    );
    item.insert(
        "UpdatedAt".to_string(),
        AttributeValue::S(format_timestamp(&todo.updated_at)),
    );

    item
}

pub fn item_to_todo(item: &Item) -> Result<Todo, String> {
    let id = TodoId::from_string(get_s(item, "Id")?.clone()).map_err(|e| e.to_string())?;
    let owner = UserId::from_string(get_s(item, "Owner")?.clone()).map_err(|e| e.to_string())?;
    let category = Category::parse(get_s(item, "Category")?.clone()).map_err(|e| e.to_string())?;
    let completed = item
        .get("Completed")
        .and_then(|v| v.as_bool().ok())
        .copied()
        .ok_or("Missing Completed")?;
    // 空の説明は保存されない場合がある
    let description = item
        .get("Description")
        .and_then(|v| v.as_s().ok())
        .cloned()
        .unwrap_or_default();

    Ok(Todo {
        id,
        owner,
        title: get_s(item, "Title")?.clone(),
        description,
        category,
        completed,
        created_at: get_timestamp(item, "CreatedAt")?,
        updated_at: get_timestamp(item, "UpdatedAt")?,
    })
}

/// 部分更新用の UpdateItem 式
#[derive(Debug, Clone, PartialEq)]
pub struct TodoUpdate {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: Item,
}

/// パッチにあるフィールドと `UpdatedAt` だけを SET する。パッチは検証済みであること
pub fn todo_update(patch: &TodoPatch, now: &DateTime<Utc>) -> TodoUpdate {
    let mut fields = vec![(
        "UpdatedAt",
        AttributeValue::S(format_timestamp(now)),
    )];
    if let Some(title) = &patch.title {
        fields.push(("Title", AttributeValue::S(title.clone())));
    }
    if let Some(description) = &patch.description {
        fields.push(("Description", AttributeValue::S(description.clone())));
    }
    if let Some(category) = &patch.category {
        fields.push(("Category", AttributeValue::S(category.clone())));
    }
    if let Some(completed) = patch.completed {
        fields.push(("Completed", AttributeValue::Bool(completed)));
    }

    let mut sets = Vec::with_capacity(fields.len());
    let mut names = HashMap::new();
    let mut values = HashMap::new();
    for (attr, value) in fields {
        let key = attr.to_ascii_lowercase();
        sets.push(format!("#{key} = :{key}"));
        names.insert(format!("#{key}"), attr.to_string());
        values.insert(format!(":{key}"), value);
    }

    TodoUpdate {
        expression: format!("SET {}", sets.join(", ")),
        names,
        values,
    }
}

pub fn user_to_item(user: &User) -> Item {
    let mut item = HashMap::new();
    DynamoDbKeys::for_user(&user.email).write_into(&mut item);

    item.insert(
        "EntityType".to_string(),
        AttributeValue::S(EntityType::User.as_str().to_string()),
    );
    item.insert("Id".to_string(), AttributeValue::S(user.id.to_string()));
    item.insert("Name".to_string(), AttributeValue::S(user.name.clone()));
    item.insert("Email".to_string(), AttributeValue::S(user.email.clone()));
    item.insert(
        "PasswordHash".to_string(),
        AttributeValue::S(user.password_hash.clone()),
    );
    item.insert(
        "CreatedAt".to_string(),
        AttributeValue::S(format_timestamp(&user.created_at)),
    );

    item
}

pub fn item_to_user(item: &Item) -> Result<User, String> {
    Ok(User {
        id: UserId::from_string(get_s(item, "Id")?.clone()).map_err(|e| e.to_string())?,
        name: get_s(item, "Name")?.clone(),
        email: get_s(item, "Email")?.clone(),
        password_hash: get_s(item, "PasswordHash")?.clone(),
        created_at: get_timestamp(item, "CreatedAt")?,
    })
}
