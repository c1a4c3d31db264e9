pub mod mock_commands;
