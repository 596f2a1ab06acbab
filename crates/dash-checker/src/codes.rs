//! Pylint message descriptions shown next to each finding.
//!
//! Only fatal (F), error (E) and warning (W) messages are listed: the
//! analyzer runs with refactor and convention checks disabled, so R and C
//! codes never reach the formatter.

/// Look up the long-form description of a pylint message code.
pub fn describe(code: &str) -> Option<&'static str> {
    let description = match code {
        // Fatal
        "F0001" => "Pylint could not analyze the module, for instance because it could not be found or read.",
        "F0002" => "An unexpected error occurred while building the module's syntax tree.",
        "F0010" => "The module could not be parsed.",
        "F0011" => "The pylint configuration file could not be parsed.",
        "F0202" => "Pylint was unable to check a method's signature compatibility.",

        // Errors
        "E0001" => "The code contains a syntax error and could not be parsed.",
        "E0011" => "An inline `# pylint:` option was not recognized.",
        "E0013" => "A plugin listed in the configuration could not be loaded.",
        "E0014" => "The configuration file contains an unexpected section.",
        "E0015" => "The configuration contains an unrecognized option.",
        "E0100" => "`__init__` is a generator because it contains `yield`; it must not be one.",
        "E0101" => "`__init__` explicitly returns a value; it must return `None`.",
        "E0102" => "A function, class or method is defined more than once in the same scope.",
        "E0103" => "`break` or `continue` is used outside of a loop.",
        "E0104" => "`return` is used outside of a function.",
        "E0105" => "`yield` is used outside of a function.",
        "E0107" => "An operator that Python does not have, such as `++` or `--`, is used.",
        "E0108" => "Two or more arguments of a function share the same name.",
        "E0110" => "An abstract class with abstract methods is being instantiated.",
        "E0111" => "`reversed()` is called on an object that is not a sequence.",
        "E0112" => "More than one starred expression appears in an assignment.",
        "E0113" => "A starred expression is used as the sole assignment target.",
        "E0114" => "A starred expression is used outside of an assignment target.",
        "E0115" => "A name is declared both `nonlocal` and `global`.",
        "E0116" => "`continue` is used inside a `finally` clause.",
        "E0117" => "A `nonlocal` name has no binding in an enclosing scope.",
        "E0118" => "A name is used before its `global` declaration.",
        "E0119" => "`format()` is called on something that is not a string.",
        "E0202" => "A method is hidden by an attribute of the same name defined in an ancestor.",
        "E0203" => "An instance attribute is accessed before it is defined.",
        "E0211" => "A method is defined without any argument; it needs at least `self`.",
        "E0213" => "A method's first argument is not named `self`.",
        "E0236" => "`__slots__` contains an object that is not a valid slot.",
        "E0237" => "An attribute not listed in the class's `__slots__` is assigned.",
        "E0238" => "`__slots__` is not a valid sequence of names.",
        "E0239" => "A class inherits from something that is not a class.",
        "E0240" => "A consistent method resolution order cannot be created for the class.",
        "E0241" => "A class lists the same base class more than once.",
        "E0242" => "A name appears both in `__slots__` and as a class variable.",
        "E0243" => "A class is assigned to `__class__` that is not a valid class object.",
        "E0244" => "An `Enum` subclass extends an enum that already defines members.",
        "E0245" => "A `__slots__` entry is assigned to a name that is not declared in `__slots__`.",
        "E0301" => "`__iter__` returns something that is not an iterator.",
        "E0302" => "A special method is defined with the wrong number of parameters.",
        "E0303" => "`__len__` returns something that is not a non-negative integer.",
        "E0304" => "`__bool__` returns something that is not a `bool`.",
        "E0305" => "`__index__` returns something that is not an integer.",
        "E0306" => "`__repr__` returns something that is not a string.",
        "E0307" => "`__str__` returns something that is not a string.",
        "E0308" => "`__bytes__` returns something that is not bytes.",
        "E0309" => "`__hash__` returns something that is not an integer.",
        "E0310" => "`__length_hint__` returns something that is not a non-negative integer.",
        "E0311" => "`__format__` returns something that is not a string.",
        "E0312" => "`__getnewargs__` returns something that is not a tuple.",
        "E0313" => "`__getnewargs_ex__` returns something that is not a tuple of the form `(tuple, dict)`.",
        "E0401" => "An imported module could not be found.",
        "E0402" => "A relative import goes beyond the top-level package.",
        "E0601" => "A local variable is used before it is assigned.",
        "E0602" => "A name is used that has not been defined.",
        "E0603" => "`__all__` lists a name that is not defined in the module.",
        "E0604" => "`__all__` contains an entry that is not a string.",
        "E0605" => "`__all__` is not a list or tuple.",
        "E0606" => "A name is used that may not be assigned on every path leading to it.",
        "E0611" => "A name imported with `from ... import` does not exist in that module.",
        "E0633" => "Something that is not a sequence is unpacked.",
        "E0643" => "A constant index is out of range for the sequence being indexed.",
        "E0701" => "An `except` clause is unreachable because an earlier clause catches a parent exception.",
        "E0702" => "Something that is not an exception class or instance is raised.",
        "E0703" => "The cause given in `raise ... from ...` is not an exception or `None`.",
        "E0704" => "A bare `raise` is used outside of an `except` clause.",
        "E0710" => "A new-style class that does not inherit from `BaseException` is raised.",
        "E0711" => "`NotImplemented` is raised; raise `NotImplementedError` instead.",
        "E0712" => "An `except` clause catches a class that does not inherit from `BaseException`.",
        "E1003" => "The first argument to `super()` is not the current class.",
        "E1101" => "An attribute or method is accessed that the object does not have.",
        "E1102" => "Something that is not callable is being called.",
        "E1111" => "The result of a function that does not return anything is assigned.",
        "E1120" => "A call is missing a value for a required parameter.",
        "E1121" => "A call passes more positional arguments than the function accepts.",
        "E1123" => "A call passes a keyword argument the function does not accept.",
        "E1124" => "A call passes the same argument both positionally and by keyword.",
        "E1125" => "A call is missing a mandatory keyword-only argument.",
        "E1126" => "A sequence is indexed with something that is not an integer.",
        "E1127" => "A slice index is not an integer, `None` or an object with `__index__`.",
        "E1128" => "The result of a function that only returns `None` is assigned.",
        "E1129" => "An object used in a `with` statement is not a context manager.",
        "E1130" => "A unary operator is applied to an operand that does not support it.",
        "E1131" => "A binary operation is applied to operands that do not support it.",
        "E1132" => "The same keyword argument is passed more than once.",
        "E1133" => "Something that is not iterable is used where an iterable is required.",
        "E1134" => "Something that is not a mapping is used where a mapping is required.",
        "E1135" => "A membership test (`in`) is applied to an object that does not support it.",
        "E1136" => "An object that does not support indexing is subscripted.",
        "E1137" => "Item assignment is used on an object that does not support it.",
        "E1138" => "Item deletion is used on an object that does not support it.",
        "E1139" => "The metaclass of a class is not a valid class.",
        "E1140" => "An unhashable object is used as a dictionary key or set member.",
        "E1141" => "A dictionary is unpacked in a `for` loop without calling `.items()`.",
        "E1142" => "`await` is used outside of an `async` function.",
        "E1143" => "An unhashable object is used as a dictionary key or set member.",
        "E1144" => "A slice uses a step of zero.",
        "E1200" => "A logging format string contains an unsupported format character.",
        "E1201" => "A logging format string ends in the middle of a conversion specifier.",
        "E1205" => "A logging call passes more arguments than the format string expects.",
        "E1206" => "A logging call passes fewer arguments than the format string expects.",
        "E1300" => "A format string contains an unsupported format character.",
        "E1301" => "A format string ends in the middle of a conversion specifier.",
        "E1302" => "A format string mixes named and unnamed conversion specifiers.",
        "E1303" => "A format string with named specifiers is not given a mapping.",
        "E1304" => "A format string refers to a key missing from the mapping.",
        "E1305" => "A format string is given more arguments than it has specifiers.",
        "E1306" => "A format string is given fewer arguments than it has specifiers.",
        "E1307" => "A format specifier is given an argument of an incompatible type.",
        "E1310" => "`strip`, `lstrip` or `rstrip` is called with a string containing duplicate characters.",
        "E1507" => "`os.getenv` is called with a value that is not a string.",
        "E1519" => "`singledispatch` is used to decorate a method; use `singledispatchmethod` instead.",
        "E1520" => "`singledispatchmethod` is used to decorate a plain function; use `singledispatch` instead.",
        "E1700" => "`yield` is used inside an `async` function.",
        "E1701" => "An object used in `async with` is not an async context manager.",
        "E2501" => "The source file declares a codec that is not UTF-8 compatible.",
        "E2502" => "The source contains bidirectional unicode control characters that can hide code.",
        "E2510" => "The source contains an unescaped backspace character.",
        "E2511" => "The source contains an unescaped carriage return character.",
        "E2512" => "The source contains an unescaped SUB character.",
        "E2513" => "The source contains an unescaped ESC character.",
        "E2514" => "The source contains an unescaped NUL character.",
        "E2515" => "The source contains an unescaped zero-width space.",
        "E3102" => "A positional-only parameter is passed as a keyword argument.",
        "E3701" => "`dataclasses.field()` is called outside of a dataclass field definition.",
        "E4702" => "A dictionary is modified while it is being iterated over.",
        "E4703" => "A set is modified while it is being iterated over.",

        // Warnings
        "W0012" => "An inline `# pylint:` option names a message that does not exist.",
        "W0101" => "The statement can never be executed.",
        "W0102" => "A mutable value such as a list or dict is used as a default argument.",
        "W0104" => "A statement has no effect.",
        "W0105" => "A string is used as a statement and has no effect.",
        "W0106" => "An expression is evaluated but its result is not used.",
        "W0107" => "A `pass` statement is unnecessary.",
        "W0108" => "A lambda only calls another function with the same arguments.",
        "W0109" => "A dictionary literal contains the same key more than once.",
        "W0120" => "A loop's `else` clause runs unconditionally because the loop has no `break`.",
        "W0122" => "`exec` is used.",
        "W0123" => "`eval` is used.",
        "W0124" => "A `with` statement's target is confusingly written as a tuple.",
        "W0125" => "A condition always evaluates to the same value.",
        "W0127" => "A variable is assigned to itself.",
        "W0128" => "The same name is assigned twice in one assignment statement.",
        "W0129" => "An `assert` is made on a string literal, so it always passes.",
        "W0130" => "A set literal contains the same value more than once.",
        "W0131" => "An assignment expression is used where its result is discarded.",
        "W0133" => "An exception is created but neither raised nor assigned.",
        "W0134" => "`return` inside `finally` swallows any exception raised in the `try` block.",
        "W0135" => "A context manager generator may not run its cleanup code.",
        "W0143" => "A callable is compared without being called.",
        "W0150" => "A `return` or `break` in a `finally` block swallows the exception.",
        "W0177" => "A value is compared to NaN with `==`; use `math.isnan` instead.",
        "W0199" => "`assert` is applied to a non-empty tuple and is always true.",
        "W0201" => "An instance attribute is defined outside of `__init__`.",
        "W0211" => "A static method's first argument is named `self` or `cls`.",
        "W0212" => "A protected member (starting with `_`) is accessed from outside its class.",
        "W0221" => "An overridden method's parameters differ from the parent's.",
        "W0222" => "An overridden method's signature differs from the parent's.",
        "W0223" => "An abstract method of a parent class is not overridden.",
        "W0231" => "`__init__` does not call the parent class's `__init__`.",
        "W0233" => "`__init__` calls the initializer of a class that is not a parent.",
        "W0235" => "A method only calls `super()` with the same arguments and is useless.",
        "W0236" => "A method is overridden with one that changes it to or from `async` or a property.",
        "W0237" => "An overriding method renames one of the parent method's parameters.",
        "W0238" => "A private class member is defined but never used.",
        "W0239" => "A method decorated with `typing.final` is overridden.",
        "W0240" => "A class decorated with `typing.final` is subclassed.",
        "W0244" => "A subclass redefines a slot already declared in a parent class.",
        "W0245" => "`super` is used without calling it.",
        "W0246" => "A method only delegates to the parent method with the same arguments.",
        "W0301" => "A statement ends with an unnecessary semicolon.",
        "W0311" => "The line is not indented by the expected amount.",
        "W0401" => "A wildcard import (`from module import *`) is used.",
        "W0404" => "A module is imported more than once.",
        "W0406" => "A module imports itself.",
        "W0410" => "A `__future__` import is not the first statement in the module.",
        "W0416" => "An import shadows a name imported earlier in the module.",
        "W0511" => "A FIXME, XXX or TODO note was found.",
        "W0601" => "A `global` variable is not defined at module level.",
        "W0602" => "A name is declared `global` but never assigned.",
        "W0603" => "The `global` statement is used to update a module variable.",
        "W0604" => "The `global` statement is used at module level, where it has no effect.",
        "W0611" => "A module or name is imported but never used.",
        "W0612" => "A variable is assigned but never used.",
        "W0613" => "A function argument is never used.",
        "W0614" => "A name brought in by a wildcard import is never used.",
        "W0621" => "A name shadows a variable from an outer scope.",
        "W0622" => "A name shadows a Python built-in.",
        "W0631" => "A loop variable is used after the loop, where it may be undefined.",
        "W0632" => "A tuple is unpacked into a different number of names than it holds.",
        "W0640" => "A closure defined in a loop captures the loop variable.",
        "W0641" => "A variable may be unused because it is only reachable through `locals()`.",
        "W0642" => "`self` or `cls` is reassigned.",
        "W0644" => "A dictionary is unpacked into a different number of names than it holds.",
        "W0702" => "A bare `except:` clause catches every exception.",
        "W0703" => "A very broad exception such as `Exception` is caught.",
        "W0705" => "The same exception is caught by more than one `except` clause.",
        "W0706" => "An `except` clause only re-raises the exception it caught.",
        "W0707" => "An exception is re-raised inside `except` without `from`.",
        "W0711" => "An `except` clause uses a binary operation such as `A or B` instead of a tuple.",
        "W0715" => "An exception is raised with a format tuple instead of a formatted string.",
        "W0716" => "An invalid operation is applied to an exception class.",
        "W0718" => "An exception handler catches an overly broad exception such as `Exception`.",
        "W0719" => "An overly broad exception such as `Exception` is raised.",
        "W1113" => "A keyword argument with a default comes before `*args`.",
        "W1114" => "Positional arguments are passed in a different order than the parameters.",
        "W1115" => "A non-string value is assigned to `__name__` or `__qualname__`.",
        "W1116" => "The second argument of `isinstance` is not a type.",
        "W1117" => "A keyword argument is also supplied positionally.",
        "W1201" => "A logging call formats its message eagerly with `%`.",
        "W1202" => "A logging call formats its message eagerly with `format()`.",
        "W1203" => "A logging call formats its message with an f-string instead of lazy `%` arguments.",
        "W1300" => "A format string's mapping key is not a string.",
        "W1301" => "A mapping passed to a format string contains an unused key.",
        "W1302" => "A `str.format` template is invalid.",
        "W1303" => "A `str.format` template refers to a keyword argument that is not passed.",
        "W1304" => "A `str.format` call passes an argument the template does not use.",
        "W1305" => "A `str.format` template mixes automatic and manual field numbering.",
        "W1306" => "A `str.format` template accesses an attribute the argument does not have.",
        "W1307" => "A `str.format` template indexes an argument with an invalid index.",
        "W1308" => "The same argument is passed twice to a string formatting call.",
        "W1309" => "An f-string has no interpolated values.",
        "W1310" => "A format string has no interpolation variables.",
        "W1401" => "A string contains a backslash escape that Python does not recognize.",
        "W1402" => "A byte string contains a `\\u` or `\\N` escape that has no effect.",
        "W1404" => "Two string literals are implicitly concatenated on one line.",
        "W1406" => "A string has a redundant `u` prefix.",
        "W1501" => "`open` is called with an invalid mode string.",
        "W1503" => "A unittest assertion is always true or always false.",
        "W1505" => "A deprecated method is called.",
        "W1506" => "`threading.Thread` is created without a `target` or `run` override.",
        "W1507" => "`os.environ` is copied with `copy.copy`, which does not detach it.",
        "W1508" => "`os.getenv` is given a default that is not a string.",
        "W1509" => "`subprocess.Popen` is called with `preexec_fn`, which is unsafe with threads.",
        "W1510" => "`subprocess.run` is called without an explicit `check` argument.",
        "W1514" => "`open` is called without an explicit `encoding`.",
        "W1515" => "A debugging call such as `breakpoint()` was left in the code.",
        "W1518" => "`lru_cache` with `maxsize=None` on a method keeps instances alive.",
        "W2101" => "A lock is created and used directly in a `with` statement, so it locks nothing.",
        "W2301" => "An ellipsis statement is unnecessary because the block has other statements.",
        "W2402" => "The module file name contains non-ASCII characters.",
        "W2601" => "f-strings are used although the configured Python version does not support them.",
        "W2602" => "`typing.final` is used although the configured Python version does not support it.",
        "W2603" => "Exception groups are used although the configured Python version does not support them.",
        "W2604" => "Generic type syntax is used although the configured Python version does not support it.",
        "W3101" => "A `requests` call is made without a timeout and may hang forever.",
        "W3301" => "`min` or `max` calls are nested where a single call would do.",
        "W3601" => "A chained comparison mixes operators in a way that is likely a mistake.",
        "W4701" => "A list is modified while it is being iterated over.",
        "W4901" => "A deprecated module is imported.",
        "W4902" => "A deprecated method is called.",
        "W4903" => "A deprecated argument is passed.",
        "W4904" => "A deprecated class is used.",
        "W4905" => "A deprecated decorator is used.",
        "W4906" => "A deprecated attribute is accessed.",
        _ => return None,
    };
    Some(description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert!(describe("W0611").unwrap().contains("imported"));
        assert!(describe("E0602").is_some());
        assert!(describe("F0001").is_some());
    }

    #[test]
    fn test_current_pylint_defaults_are_described() {
        let defaults = [
            "W0718", "W0719", "W1203", "W1510", "W3101", "W0237", "W0238", "W0127", "W0246",
            "W2301", "W4901", "W4902", "W4903", "W4904", "W4905", "W4906", "E0606", "E0643",
            "E1142", "E1143", "E2501", "E2502", "E2510", "E2511", "E2512", "E2513", "E2514",
            "E2515", "W0012", "W0632", "W1309", "W1514", "E0601", "W0611", "W0612", "W0613",
        ];
        let missing: Vec<_> = defaults.iter().filter(|code| describe(code).is_none()).collect();
        assert!(missing.is_empty(), "undescribed codes: {missing:?}");
    }

    #[test]
    fn test_unknown_and_disabled_codes() {
        assert!(describe("Z9999").is_none());
        assert!(describe("C0114").is_none());
        assert!(describe("w0611").is_none());
    }
}
