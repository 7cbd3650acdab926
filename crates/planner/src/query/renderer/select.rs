use crate::query::{
    ast::{
        common::OrderDir,
        select::{FromClause, OrderByExpr, Select},
    },
    renderer::{Render, Renderer},
};

impl Render for Select {
    fn render(&self, r: &mut Renderer) {
        // 1. SELECT clause
        r.sql.push_str("SELECT ");
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                r.sql.push_str(", ");
            }
            col.render(r);
        }

        // 2. FROM
        if let Some(from) = &self.from {
            r.sql.push(' ');
            from.render(r);
        }

        // 3. WHERE
        if let Some(where_clause) = &self.where_clause {
            r.sql.push_str(" WHERE ");
            where_clause.render(r);
        }

        // 4. ORDER BY
        if !self.order_by.is_empty() {
            r.sql.push_str(" ORDER BY ");
            for (i, order) in self.order_by.iter().enumerate() {
                if i > 0 {
                    r.sql.push_str(", ");
                }
                order.render(r);
            }
        }

        // 5. LIMIT
        if let Some(limit) = &self.limit {
            r.sql.push_str(" LIMIT ");
            limit.render(r);
        }
    }
}

impl Render for FromClause {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("FROM ");
        if let Some(schema) = &self.table.schema {
            r.sql.push_str(&r.dialect.quote_identifier(schema));
            r.sql.push('.');
        }
        r.sql
            .push_str(&r.dialect.quote_identifier(&self.table.name));
        if let Some(alias) = &self.alias {
            r.sql.push_str(" AS ");
            r.sql.push_str(&r.dialect.quote_identifier(alias));
        }
    }
}

impl Render for OrderByExpr {
    fn render(&self, r: &mut Renderer) {
        self.expr.render(r);
        if let Some(dir) = &self.direction {
            let dir_str = match dir {
                OrderDir::Asc => "ASC",
                OrderDir::Desc => "DESC",
            };
            r.sql.push(' ');
            r.sql.push_str(dir_str);
        }
    }
}

#[cfg(test)]
mod tests {
    use model::core::value::Value;

    use crate::query::{
        ast::{
            common::{OrderDir, TableRef},
            expr::{BinaryOperator, Expr},
            select::{FromClause, OrderByExpr, Select},
        },
        dialect::{MySql, Postgres},
        ident,
        renderer::render,
        value,
    };

    fn users() -> Option<FromClause> {
        Some(FromClause {
            table: TableRef {
                schema: Some("app".to_string()),
                name: "users".to_string(),
            },
            alias: None,
        })
    }

    #[test]
    fn test_simple_select_postgres() {
        let ast = Select {
            columns: vec![ident("id"), ident("name")],
            from: users(),
            where_clause: Some(Expr::binary(
                ident("id"),
                BinaryOperator::Eq,
                value(Value::Int(123)),
            )),
            ..Default::default()
        };

        let (sql, params) = render(&ast, &Postgres);

        assert_eq!(
            sql,
            r#"SELECT "id", "name" FROM "app"."users" WHERE ("id" = $1)"#
        );
        assert_eq!(params, vec![Value::Int(123)]);
    }

    #[test]
    fn test_ordered_limited_select_mysql() {
        let ast = Select {
            columns: vec![ident("id")],
            from: users(),
            where_clause: Some(Expr::binary(
                ident("name"),
                BinaryOperator::NotEq,
                value(Value::String("x'; DROP TABLE users; --".to_string())),
            )),
            order_by: vec![OrderByExpr {
                expr: ident("id"),
                direction: Some(OrderDir::Asc),
            }],
            limit: Some(value(Value::Uint(10))),
        };

        let (sql, params) = render(&ast, &MySql);

        assert_eq!(
            sql,
            "SELECT `id` FROM `app`.`users` WHERE (`name` <> ?) ORDER BY `id` ASC LIMIT ?"
        );
        assert_eq!(
            params,
            vec![
                Value::String("x'; DROP TABLE users; --".to_string()),
                Value::Uint(10)
            ]
        );
    }
}
