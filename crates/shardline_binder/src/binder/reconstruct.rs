//! Copying statement attributes from a raw statement onto its bound copy.

use shardline_ast::ast::{
    AlterIndexStatement, AlterTableStatement, AlterViewStatement, CommentStatement,
    CreateIndexStatement, CreateTableStatement, CreateViewStatement, DeclareCursorStatement,
    DeleteStatement, DropIndexStatement, DropTableStatement, DropViewStatement, InsertStatement,
    PrepareStatement, RenameTableStatement, SelectStatement, StatementAttributes,
    TruncateStatement, UpdateStatement,
};

/// Statement structs carrying statement level attributes.
pub trait HasAttributes {
    fn attributes(&self) -> &StatementAttributes;
    fn attributes_mut(&mut self) -> &mut StatementAttributes;
}

macro_rules! impl_has_attributes {
    ($($ty:ty),* $(,)?) => {
        $(
            impl HasAttributes for $ty {
                fn attributes(&self) -> &StatementAttributes {
                    &self.attributes
                }

                fn attributes_mut(&mut self) -> &mut StatementAttributes {
                    &mut self.attributes
                }
            }
        )*
    };
}

impl_has_attributes!(
    CreateTableStatement,
    AlterTableStatement,
    DropTableStatement,
    RenameTableStatement,
    TruncateStatement,
    CreateViewStatement,
    AlterViewStatement,
    DropViewStatement,
    CommentStatement,
    CreateIndexStatement,
    AlterIndexStatement,
    DropIndexStatement,
    DeclareCursorStatement,
    PrepareStatement,
    SelectStatement,
    InsertStatement,
    UpdateStatement,
    DeleteStatement,
);

/// Copy parameter markers, comments, declared variables and hints from
/// `source` onto `target`.
///
/// The lists are shared, not cloned element by element.
pub fn copy_attributes<S, T>(source: &S, target: &mut T)
where
    S: HasAttributes + ?Sized,
    T: HasAttributes + ?Sized,
{
    *target.attributes_mut() = source.attributes().clone();
}

#[cfg(test)]
mod tests {
    use shardline_ast::{
        ast::HintSegment,
        builder::{table, with_parameters},
    };

    use super::*;

    #[test]
    fn copy_shares_lists() {
        let mut attributes = with_parameters(2);
        attributes.hints = vec![HintSegment {
            text: "SHARDLINE_HINT: SKIP_METADATA_VALIDATE=true".to_string(),
            span: Default::default(),
        }]
        .into();
        let source = TruncateStatement {
            attributes,
            tables: vec![table("t_order")],
        };
        let mut target = TruncateStatement {
            attributes: StatementAttributes::default(),
            tables: Vec::new(),
        };

        copy_attributes(&source, &mut target);

        assert!(source.attributes.shares_with(target.attributes()));
        assert_eq!(2, target.attributes.parameter_count());
        assert!(target.attributes.skip_metadata_validate());
    }
}
