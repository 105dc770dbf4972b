use crm_orm::Model;

#[derive(Model)]
#[orm(table = "role")]
pub struct Role {
    #[orm(primary_key)]
    pub id: i32,
    #[orm(char(max_length = 64), unique, required)]
    pub name: String,
    #[orm(as_name = "user_ids", many2many(target = "user", link_table = "user_roles", col_self = "role_id", col_other = "user_id"))]
    pub users: (),
}
