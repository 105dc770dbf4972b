use crm_orm::Model;

#[derive(Model)]
#[orm(table = "user")]
pub struct User {
    #[orm(primary_key)]
    pub id: i32,
    #[orm(char(max_length = 255), required)]
    pub name: String,
    #[orm(char(max_length = 255), unique, required)]
    pub login: String,
    #[orm(char(max_length = 255), required)]
    pub password_hash: String,
    #[orm(char(max_length = 255), required)]
    pub password_salt: String,
    #[orm(null = true)]
    pub lang_id: Option<i32>,
    #[orm(as_name = "role_ids", many2many(target = "role", link_table = "user_roles", col_self = "user_id", col_other = "role_id"))]
    pub roles: (),
}
