use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_orders_table::Migration),
            Box::new(m20240101_000002_create_order_items_table::Migration),
            Box::new(m20240101_000003_create_users_table::Migration),
            Box::new(m20240101_000004_create_sessions_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_orders_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create orders table aligned with entities::order Model
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::OrderNumber).string().not_null())
                        .col(ColumnDef::new(Orders::Sender).string().not_null())
                        .col(ColumnDef::new(Orders::SenderPhone).string().not_null())
                        .col(ColumnDef::new(Orders::SenderAddress).string().not_null())
                        .col(ColumnDef::new(Orders::ProductCode).string().not_null())
                        .col(ColumnDef::new(Orders::Receiver).string().not_null())
                        .col(ColumnDef::new(Orders::ReceiverPhone).string().not_null())
                        .col(ColumnDef::new(Orders::ReceiverAddress).string().not_null())
                        .col(
                            ColumnDef::new(Orders::TotalFreight)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::PaymentMethod).string().not_null())
                        .col(
                            ColumnDef::new(Orders::ReturnRequirement)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::OtherExpenses)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::ExpenseDetails).string().not_null())
                        .col(ColumnDef::new(Orders::Carrier).string().not_null())
                        .col(ColumnDef::new(Orders::CarrierAddress).string().not_null())
                        .col(ColumnDef::new(Orders::ArrivalAddress).string().not_null())
                        .col(ColumnDef::new(Orders::DepartureStationPhone).string().null())
                        .col(
                            ColumnDef::new(Orders::ArrivalStationPhone)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::CustomerOrderNo).string().not_null())
                        .col(ColumnDef::new(Orders::Date).string().null())
                        .col(
                            ColumnDef::new(Orders::DepartureStation)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::ArrivalStation).string().not_null())
                        .col(ColumnDef::new(Orders::TransportMethod).string().not_null())
                        .col(ColumnDef::new(Orders::DeliveryMethod).string().not_null())
                        .col(ColumnDef::new(Orders::SenderSign).string().not_null())
                        .col(ColumnDef::new(Orders::ReceiverSign).string().not_null())
                        .col(ColumnDef::new(Orders::IdCard).string().not_null())
                        .col(ColumnDef::new(Orders::OrderMaker).string().not_null())
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            // order_number is the public identifier; keep it unique
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_order_number")
                        .table(Orders::Table)
                        .col(Orders::OrderNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // Listing is ordered by creation time
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_created_at")
                        .table(Orders::Table)
                        .col(Orders::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Orders {
        Table,
        Id,
        OrderNumber,
        Sender,
        SenderPhone,
        SenderAddress,
        ProductCode,
        Receiver,
        ReceiverPhone,
        ReceiverAddress,
        TotalFreight,
        PaymentMethod,
        ReturnRequirement,
        OtherExpenses,
        ExpenseDetails,
        Carrier,
        CarrierAddress,
        ArrivalAddress,
        DepartureStationPhone,
        ArrivalStationPhone,
        CustomerOrderNo,
        Date,
        DepartureStation,
        ArrivalStation,
        TransportMethod,
        DeliveryMethod,
        SenderSign,
        ReceiverSign,
        IdCard,
        OrderMaker,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_order_items_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_orders_table::Orders;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_order_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::Position).integer().not_null())
                        .col(ColumnDef::new(OrderItems::ItemName).string().not_null())
                        .col(ColumnDef::new(OrderItems::PackageType).string().not_null())
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(ColumnDef::new(OrderItems::Weight).decimal().not_null())
                        .col(ColumnDef::new(OrderItems::Volume).decimal().not_null())
                        .col(
                            ColumnDef::new(OrderItems::DeliveryCharge)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(OrderItems::InsuranceFee)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(OrderItems::PackagingFee)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(OrderItems::GoodsValue)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(OrderItems::Remarks).string().not_null())
                        .col(ColumnDef::new(OrderItems::Freight).decimal().not_null())
                        .col(ColumnDef::new(OrderItems::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order_id")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        Position,
        ItemName,
        PackageType,
        Quantity,
        Weight,
        Volume,
        DeliveryCharge,
        InsuranceFee,
        PackagingFee,
        GoodsValue,
        Remarks,
        Freight,
        CreatedAt,
    }
}

mod m20240101_000003_create_users_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Username).string().not_null())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_username")
                        .table(Users::Table)
                        .col(Users::Username)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Users {
        Table,
        Id,
        Username,
        PasswordHash,
        CreatedAt,
    }
}

mod m20240101_000004_create_sessions_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000003_create_users_table::Users;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_sessions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Sessions::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Sessions::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Sessions::UserId).uuid().not_null())
                        .col(ColumnDef::new(Sessions::TokenHash).string().not_null())
                        .col(ColumnDef::new(Sessions::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Sessions::ExpiresAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sessions_user_id")
                                .from(Sessions::Table, Sessions::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sessions_token_hash")
                        .table(Sessions::Table)
                        .col(Sessions::TokenHash)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Sessions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Sessions {
        Table,
        Id,
        UserId,
        TokenHash,
        CreatedAt,
        ExpiresAt,
    }
}
