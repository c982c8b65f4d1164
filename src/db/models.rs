use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbDevice {
    pub device: String,
    pub name: String,
    pub config: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbVirtual {
    pub name: String,
    pub config: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbSetting {
    #[sqlx(rename = "type")]
    pub ty: String,
    pub config: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbMeta {
    pub uuid: String,
    pub created_at: String,
}
