use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Flows::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Flows::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Flows::FlowId).string_len(36).not_null())
                    .col(ColumnDef::new(Flows::Handle).string_len(255).not_null())
                    .col(ColumnDef::new(Flows::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Flows::FlowType).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Flows::ActiveVersion)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Flows::DeploymentId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Flows::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Flows::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .index(
                        Index::create()
                            .name("uq_flow_deployment_flow_id")
                            .col(Flows::DeploymentId)
                            .col(Flows::FlowId)
                            .unique(),
                    )
                    .index(
                        Index::create()
                            .name("uq_flow_deployment_handle_type")
                            .col(Flows::DeploymentId)
                            .col(Flows::Handle)
                            .col(Flows::FlowType)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Flows::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Flows {
    Table,
    Id,
    FlowId,
    Handle,
    Name,
    FlowType,
    ActiveVersion,
    DeploymentId,
    CreatedAt,
    UpdatedAt,
}
